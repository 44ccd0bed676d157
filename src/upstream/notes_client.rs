use async_trait::async_trait;
use base64::Engine;
use tracing::info;

use crate::error::{Error, Result};
use crate::session::{NoteDraft, NoteSink};

/// The notes API as seen from a client shell: finished drafts are posted to
/// the server with the session's bearer token, audio carried as base64.
pub struct HttpNoteSink {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpNoteSink {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
        }
    }
}

#[async_trait]
impl NoteSink for HttpNoteSink {
    async fn save(&self, draft: NoteDraft) -> Result<()> {
        let mut body = serde_json::json!({
            "transcript": draft.transcript,
            "duration_seconds": draft.duration_seconds,
        });
        if let Some(audio) = &draft.audio {
            body["audio_base64"] = serde_json::Value::String(
                base64::engine::general_purpose::STANDARD.encode(&audio.data),
            );
            if let Some(mime_type) = &audio.mime_type {
                body["audio_mime_type"] = serde_json::Value::String(mime_type.clone());
            }
        }

        let url = format!("{}/notes", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("note upload failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Persistence(format!(
                "note upload failed: {}",
                response.status()
            )));
        }

        info!("note saved ({}s)", draft.duration_seconds);
        Ok(())
    }
}
