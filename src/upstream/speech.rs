use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// Server-side minting of the short-lived streaming credential. The
/// long-lived vendor key stays behind this trait and never reaches a client.
#[async_trait]
pub trait SpeechKeyMinter: Send + Sync {
    async fn mint(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct Project {
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    key: String,
}

/// Mints narrowly-scoped temporary keys through the speech vendor's
/// management API.
pub struct HttpSpeechKeyMinter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    key_ttl: Duration,
}

impl HttpSpeechKeyMinter {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, key_ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            key_ttl,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl SpeechKeyMinter for HttpSpeechKeyMinter {
    async fn mint(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url("/projects"))
            .header("Authorization", format!("Token {}", self.api_key))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("project listing failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "project listing failed: {}",
                response.status()
            )));
        }
        let projects: ProjectsResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("project listing unreadable: {e}")))?;
        let project_id = projects
            .projects
            .into_iter()
            .next()
            .map(|p| p.project_id)
            .ok_or_else(|| Error::Upstream("no speech project configured".to_string()))?;

        let body = serde_json::json!({
            "comment": "voixnotes-temp",
            "scopes": ["usage:write"],
            "time_to_live_in_seconds": self.key_ttl.as_secs(),
        });
        let response = self
            .client
            .post(self.url(&format!("/projects/{project_id}/keys")))
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("key mint failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "key mint failed: {}",
                response.status()
            )));
        }
        let minted: KeyResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("key mint unreadable: {e}")))?;

        info!("minted streaming key (ttl {}s)", self.key_ttl.as_secs());
        Ok(minted.key)
    }
}
