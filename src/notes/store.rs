use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewNote, Note};
use crate::error::Result;

/// Note record persistence, scoped to the owning user on every operation.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, new_note: NewNote) -> Result<Note>;

    /// All notes for one user, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Note>>;

    async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<Note>>;

    /// Set the summary. Returns `false` when no such note exists for this
    /// user.
    async fn set_summary(&self, user_id: &str, id: Uuid, summary: &str) -> Result<bool>;

    /// Remove the record, returning it if it existed.
    async fn remove(&self, user_id: &str, id: Uuid) -> Result<Option<Note>>;
}

/// In-process note store backed by an insertion-ordered list.
pub struct MemoryNoteStore {
    notes: RwLock<Vec<Note>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, new_note: NewNote) -> Result<Note> {
        let note = Note {
            id: Uuid::new_v4(),
            user_id: new_note.user_id,
            transcript: new_note.transcript,
            summary: None,
            audio_path: new_note.audio_path,
            duration_seconds: new_note.duration_seconds,
            created_at: Utc::now(),
        };
        self.notes.write().await.push(note.clone());
        Ok(note)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Note>> {
        let notes = self.notes.read().await;
        Ok(notes
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<Note>> {
        let notes = self.notes.read().await;
        Ok(notes
            .iter()
            .find(|n| n.id == id && n.user_id == user_id)
            .cloned())
    }

    async fn set_summary(&self, user_id: &str, id: Uuid, summary: &str) -> Result<bool> {
        let mut notes = self.notes.write().await;
        match notes
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(note) => {
                note.summary = Some(summary.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, user_id: &str, id: Uuid) -> Result<Option<Note>> {
        let mut notes = self.notes.write().await;
        match notes
            .iter()
            .position(|n| n.id == id && n.user_id == user_id)
        {
            Some(index) => Ok(Some(notes.remove(index))),
            None => Ok(None),
        }
    }
}
