//! Recording session coordination
//!
//! This module provides the `RecordingCoordinator` abstraction that manages:
//! - The combined `Idle -> Acquiring -> Recording -> Stopping -> Idle` lifecycle
//! - Microphone acquisition ordering between transcription and raw audio
//! - Merging finalized and trailing interim text into the note transcript
//! - Handing finished drafts to the persistence collaborator

mod config;
mod coordinator;

pub use config::{CaptureSettings, MicArbitration};
pub use coordinator::{
    NoteDraft, NoteSink, RecordingCoordinator, SessionEvent, SessionState,
};
