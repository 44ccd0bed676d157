//! Microphone capture
//!
//! This module provides chunked audio recording behind a platform seam:
//! - `MicrophoneBackend`: the device acquisition/encoding trait a shell
//!   implements against its recorder machinery
//! - `AudioCaptureSession`: permission probe, encoding negotiation, chunk
//!   buffering, duration tracking, and guaranteed device release

pub mod backend;
pub mod session;

pub use backend::{AudioBlob, AudioChunk, CaptureFormat, MicPermission, MicrophoneBackend};
pub use session::{AudioCaptureSession, CaptureOutcome};
