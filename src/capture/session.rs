use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use super::backend::{AudioBlob, AudioChunk, CaptureFormat, MicPermission, MicrophoneBackend};
use crate::error::{Error, Result};

/// Encoding candidates, tried in order at acquisition time. Constrained
/// platforms may support none of these; that is not an error, the platform
/// default encoding is used instead.
const MIME_CANDIDATES: [&str; 4] = [
    "audio/webm;codecs=opus",
    "audio/webm",
    "audio/mp4",
    "audio/ogg;codecs=opus",
];

/// Result of stopping a capture session. Stopping an already-stopped session
/// yields `audio: None` and a zero duration rather than an error.
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    pub audio: Option<AudioBlob>,
    pub duration_secs: u64,
}

/// One microphone recording: acquisition, chunk buffering, duration tracking,
/// and guaranteed device release on stop.
pub struct AudioCaptureSession {
    backend: Box<dyn MicrophoneBackend>,
    chunk_interval: Duration,
    chunks: Arc<Mutex<Vec<AudioChunk>>>,
    mime_type: Option<String>,
    started_at: Option<Instant>,
    duration_tx: watch::Sender<u64>,
    pump_task: Option<JoinHandle<()>>,
    ticker_task: Option<JoinHandle<()>>,
    recording: bool,
}

impl AudioCaptureSession {
    pub fn new(backend: Box<dyn MicrophoneBackend>, chunk_interval: Duration) -> Self {
        let (duration_tx, _) = watch::channel(0);
        Self {
            backend,
            chunk_interval,
            chunks: Arc::new(Mutex::new(Vec::new())),
            mime_type: None,
            started_at: None,
            duration_tx,
            pump_task: None,
            ticker_task: None,
            recording: false,
        }
    }

    /// Elapsed whole seconds, updated once per second while recording and
    /// once more with the final duration on stop.
    pub fn duration_updates(&self) -> watch::Receiver<u64> {
        self.duration_tx.subscribe()
    }

    /// Encoding negotiated at acquisition time, `None` for platform default.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Acquire the microphone and start recording.
    ///
    /// When `observer` is set, every non-empty chunk is forwarded to it in
    /// emission order after being appended to the session buffer (the
    /// streaming transcription backend relays these frames).
    pub async fn start(
        &mut self,
        observer: Option<mpsc::UnboundedSender<AudioChunk>>,
    ) -> Result<()> {
        if self.recording {
            warn!("audio capture already started");
            return Ok(());
        }

        // Probe permission first to fail fast with a precise reason.
        if self.backend.permission() == MicPermission::Denied {
            return Err(Error::PermissionDenied);
        }

        let mime_type = negotiate_mime(self.backend.as_ref());
        if mime_type.is_none() {
            debug!("no preferred audio encoding supported, using platform default");
        }

        let format = CaptureFormat {
            mime_type: mime_type.clone(),
            chunk_interval: self.chunk_interval,
        };
        let mut chunk_rx = self.backend.start(&format).await?;

        info!(
            "microphone acquired via {} (encoding: {})",
            self.backend.name(),
            mime_type.as_deref().unwrap_or("platform default")
        );
        self.mime_type = mime_type;

        let chunks = Arc::clone(&self.chunks);
        self.pump_task = Some(tokio::spawn(async move {
            while let Some(chunk) = chunk_rx.recv().await {
                if chunk.data.is_empty() {
                    continue;
                }
                chunks.lock().await.push(chunk.clone());
                if let Some(tx) = &observer {
                    // The receiving side may be gone when transcription has
                    // degraded; the recording itself keeps going.
                    let _ = tx.send(chunk);
                }
            }
            debug!("capture chunk stream ended");
        }));

        let started = Instant::now();
        self.started_at = Some(started);
        self.duration_tx.send_replace(0);

        let duration_tx = self.duration_tx.clone();
        self.ticker_task = Some(tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(1));
            tick.tick().await; // first tick completes immediately
            loop {
                tick.tick().await;
                duration_tx.send_replace(started.elapsed().as_secs());
            }
        }));

        self.recording = true;
        Ok(())
    }

    /// Stop recording and return the concatenated audio.
    ///
    /// Idempotent: a second stop returns `{audio: None, duration: 0}`. The
    /// device is released even when the backend misbehaves on the way down.
    pub async fn stop(&mut self) -> CaptureOutcome {
        if !self.recording {
            return CaptureOutcome::default();
        }
        self.recording = false;

        // Cancel the tick before computing the final duration so a late tick
        // cannot race the stop-finalization merge.
        if let Some(ticker) = self.ticker_task.take() {
            ticker.abort();
        }
        let duration_secs = self
            .started_at
            .take()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        self.duration_tx.send_replace(duration_secs);

        if let Err(e) = self.backend.stop().await {
            warn!("failed to stop microphone backend: {e}");
        }
        if let Some(pump) = self.pump_task.take() {
            if let Err(e) = pump.await {
                warn!("capture pump task panicked: {e}");
            }
        }

        let mut chunks = self.chunks.lock().await;
        let data: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        chunks.clear();
        drop(chunks);

        info!("audio capture stopped ({duration_secs}s, {} bytes)", data.len());

        let audio = (!data.is_empty()).then(|| AudioBlob {
            data,
            mime_type: self.mime_type.clone(),
        });
        CaptureOutcome {
            audio,
            duration_secs,
        }
    }
}

/// Pick the first supported encoding from the candidate list.
fn negotiate_mime(backend: &dyn MicrophoneBackend) -> Option<String> {
    MIME_CANDIDATES
        .iter()
        .find(|candidate| backend.is_mime_supported(candidate))
        .map(|candidate| candidate.to_string())
}
