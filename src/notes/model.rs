use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted voice note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,

    pub user_id: String,

    pub transcript: String,

    /// The only field mutable after creation, set by summarization.
    pub summary: Option<String>,

    /// Object-store path of the recording, when audio was captured.
    pub audio_path: Option<String>,

    pub duration_seconds: u64,

    /// Set at creation, immutable.
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a note; the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub user_id: String,
    pub transcript: String,
    pub audio_path: Option<String>,
    pub duration_seconds: u64,
}
