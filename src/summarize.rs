use async_trait::async_trait;

use crate::error::Result;

/// Summarization collaborator: synchronous from the caller's perspective,
/// whatever streaming happens inside. Empty transcripts are a caller error
/// and are rejected before this trait is reached.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String>;
}
