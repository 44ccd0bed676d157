use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// A bounded slice of encoded audio emitted periodically during capture.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Opaque encoded bytes in the negotiated container format.
    pub data: Vec<u8>,
}

/// The immutable recording produced when a capture session stops: all chunks
/// concatenated, tagged with the encoding negotiated at acquisition time.
#[derive(Debug, Clone)]
pub struct AudioBlob {
    pub data: Vec<u8>,
    /// `None` means the platform default encoding was used.
    pub mime_type: Option<String>,
}

impl AudioBlob {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Microphone permission as reported by the platform. Queried before
/// acquisition so a denied microphone fails with a precise reason instead of
/// a generic device error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicPermission {
    Granted,
    Denied,
    /// The platform will prompt on acquisition.
    Prompt,
    /// The platform cannot answer the query; proceed and let acquisition decide.
    Unknown,
}

/// Requested capture format, resolved once at acquisition time.
#[derive(Debug, Clone)]
pub struct CaptureFormat {
    /// Negotiated encoding, `None` for the platform default.
    pub mime_type: Option<String>,
    /// Cadence of chunk emission.
    pub chunk_interval: Duration,
}

/// Microphone capture seam.
///
/// Platform shells implement this against their recorder machinery (a
/// browser's MediaRecorder, an OS capture API on desktop). `start` returns a
/// channel receiver delivering encoded chunks in emission order; `stop` must
/// release every acquired device track and drop the chunk sender, ending the
/// stream.
#[async_trait]
pub trait MicrophoneBackend: Send {
    /// Query permission state without acquiring the device.
    fn permission(&self) -> MicPermission;

    /// Whether the platform encoder supports the given MIME type.
    fn is_mime_supported(&self, mime_type: &str) -> bool;

    /// Acquire the microphone and start emitting chunks.
    async fn start(&mut self, format: &CaptureFormat) -> Result<mpsc::Receiver<AudioChunk>>;

    /// Stop capturing and release all acquired device tracks.
    async fn stop(&mut self) -> Result<()>;

    /// Check if the backend is currently capturing.
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging.
    fn name(&self) -> &str;
}
