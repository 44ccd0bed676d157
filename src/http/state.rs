use std::sync::Arc;

use super::auth::AuthVerifier;
use crate::notes::{NoteStore, ObjectStore};
use crate::ratelimit::{RateLimiter, RateQuota};
use crate::summarize::Summarizer;
use crate::upstream::SpeechKeyMinter;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub auth: Arc<dyn AuthVerifier>,
    pub summarizer: Arc<dyn Summarizer>,
    pub speech_keys: Arc<dyn SpeechKeyMinter>,
    pub limiter: Arc<RateLimiter>,
    /// Tighter allowance for the costlier summarization endpoint.
    pub summarize_quota: RateQuota,
}
