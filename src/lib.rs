pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod notes;
pub mod ratelimit;
pub mod session;
pub mod summarize;
pub mod transcribe;
pub mod upstream;

pub use capture::{
    AudioBlob, AudioCaptureSession, AudioChunk, CaptureFormat, CaptureOutcome, MicPermission,
    MicrophoneBackend,
};
pub use config::Config;
pub use error::{Error, Result};
pub use http::{create_router, AppState, AuthVerifier, StaticTokenVerifier};
pub use notes::{MemoryNoteStore, MemoryObjectStore, NewNote, Note, NoteStore, ObjectStore};
pub use ratelimit::{RateDecision, RateLimiter, RateQuota};
pub use session::{
    CaptureSettings, MicArbitration, NoteDraft, NoteSink, RecordingCoordinator, SessionEvent,
    SessionState,
};
pub use summarize::Summarizer;
pub use transcribe::{
    Recognizer, RecognizerEvent, RecognizerSession, SpeechTokenSource, StreamingChannel,
    StreamingSession, TranscriptBuffer, TranscriptEvent, TranscriptSnapshot, TranscriptionSession,
};
