//! Live transcription
//!
//! Two interchangeable backends behind one contract:
//! - `RecognizerSession`: an on-device continuous recognizer, with restart
//!   handling for engines that silently end a session after a pause
//! - `StreamingSession`: a server-relayed streaming channel fed by the audio
//!   chunk stream, with end-of-stream flush handling
//!
//! Both maintain a `TranscriptBuffer` (append-only final text, fully-replaced
//! interim text) and emit `TranscriptEvent`s in arrival order.

pub mod recognizer;
pub mod streaming;

pub use recognizer::{Recognizer, RecognizerEvent, RecognizerSession};
pub use streaming::{SpeechTokenSource, StreamingChannel, StreamingSession};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::capture::AudioChunk;
use crate::error::Result;

/// Incremental output of a transcription session, delivered in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// A committed segment was appended to the final transcript.
    FinalDelta(String),
    /// The volatile interim text was replaced in full.
    InterimReplace(String),
    /// The session is no longer listening but recording continues.
    Degraded(String),
    /// The session stopped listening for good (explicit stop, exhausted
    /// restarts, or channel teardown).
    Ended,
}

/// Accumulated transcript state for one recording session.
///
/// `final_text` only ever grows; `interim_text` is replaced wholesale on
/// every update and carries no durability guarantee until merged at stop.
#[derive(Debug, Clone, Default)]
pub struct TranscriptBuffer {
    final_text: String,
    interim_text: String,
}

impl TranscriptBuffer {
    /// Append a committed segment and clear the interim text it supersedes.
    pub fn commit_final(&mut self, segment: &str) {
        self.final_text.push_str(segment);
        if !self.final_text.is_empty() && !self.final_text.ends_with(' ') {
            self.final_text.push(' ');
        }
        self.interim_text.clear();
    }

    /// Replace the interim text in full.
    pub fn replace_interim(&mut self, text: &str) {
        self.interim_text.clear();
        self.interim_text.push_str(text);
    }

    pub fn clear_interim(&mut self) {
        self.interim_text.clear();
    }

    /// Full reset of both buffers.
    pub fn reset(&mut self) {
        self.final_text.clear();
        self.interim_text.clear();
    }

    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            final_text: self.final_text.clone(),
            interim_text: self.interim_text.clone(),
        }
    }
}

/// Point-in-time copy of a transcript buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSnapshot {
    pub final_text: String,
    pub interim_text: String,
}

impl TranscriptSnapshot {
    /// Session-end transcript: committed text plus any trailing interim
    /// words, space-joined with the interim last, trimmed. Words the
    /// recognizer never got to finalize are not lost.
    pub fn merged(&self) -> String {
        let combined = if self.interim_text.is_empty() {
            self.final_text.clone()
        } else if self.final_text.trim().is_empty() {
            self.interim_text.clone()
        } else {
            format!("{} {}", self.final_text.trim_end(), self.interim_text)
        };
        combined.trim().to_string()
    }
}

/// One live transcription session, polymorphic over backend.
#[async_trait]
pub trait TranscriptionSession: Send {
    /// Whether this backend is usable on the current platform.
    fn is_supported(&self) -> bool;

    /// Begin listening. Events are delivered to `events` in arrival order
    /// until the session ends.
    async fn start(&mut self, events: Option<mpsc::UnboundedSender<TranscriptEvent>>)
        -> Result<()>;

    /// Stop listening, flushing trailing recognized text, and return the
    /// transcript as of the stop. Final text is retained until `reset`.
    async fn stop(&mut self) -> Result<TranscriptSnapshot>;

    /// Clear both buffers. Only valid while not listening.
    async fn reset(&mut self) -> Result<()>;

    async fn snapshot(&self) -> TranscriptSnapshot;

    fn is_listening(&self) -> bool;

    /// Sink for encoded audio chunks, for backends that relay the audio
    /// themselves. `None` for on-device recognition.
    fn chunk_sink(&self) -> Option<mpsc::UnboundedSender<AudioChunk>>;
}

/// Deliver an event to the optional observer, ignoring a dropped receiver.
pub(crate) fn emit(events: &Option<mpsc::UnboundedSender<TranscriptEvent>>, event: TranscriptEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_text_is_append_only_across_interim_churn() {
        let mut buffer = TranscriptBuffer::default();
        buffer.replace_interim("he");
        buffer.replace_interim("hello");
        buffer.commit_final("hello");
        let len_after_first = buffer.snapshot().final_text.len();

        buffer.replace_interim("wor");
        buffer.replace_interim("world");
        buffer.commit_final("world");
        let snapshot = buffer.snapshot();

        assert!(snapshot.final_text.len() > len_after_first);
        assert!(snapshot.final_text.starts_with("hello "));
        assert_eq!(snapshot.final_text, "hello world ");
    }

    #[test]
    fn interim_is_replaced_never_concatenated() {
        let mut buffer = TranscriptBuffer::default();
        buffer.replace_interim("testing one");
        buffer.replace_interim("testing one two");
        assert_eq!(buffer.snapshot().interim_text, "testing one two");
    }

    #[test]
    fn final_commit_clears_interim() {
        let mut buffer = TranscriptBuffer::default();
        buffer.replace_interim("hello");
        buffer.commit_final("hello");
        assert_eq!(buffer.snapshot().interim_text, "");
    }

    #[test]
    fn merge_joins_final_and_trailing_interim() {
        let snapshot = TranscriptSnapshot {
            final_text: "hello ".to_string(),
            interim_text: "world".to_string(),
        };
        assert_eq!(snapshot.merged(), "hello world");
    }

    #[test]
    fn merge_of_empty_buffers_is_empty() {
        assert_eq!(TranscriptSnapshot::default().merged(), "");
        let whitespace_only = TranscriptSnapshot {
            final_text: "   ".to_string(),
            interim_text: String::new(),
        };
        assert_eq!(whitespace_only.merged(), "");
    }

    #[test]
    fn merge_with_interim_only_keeps_trailing_words() {
        let snapshot = TranscriptSnapshot {
            final_text: String::new(),
            interim_text: "never finalized".to_string(),
        };
        assert_eq!(snapshot.merged(), "never finalized");
    }
}
