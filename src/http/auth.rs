use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use super::state::AppState;
use crate::error::{Error, Result};

/// Boundary to the hosted identity provider: resolves a bearer token to a
/// user identity, or `None` for anything it does not recognize.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<String>;
}

/// Static token table, for development deployments and tests.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl AuthVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

/// Resolve the calling user or fail with `Unauthorized`.
pub(super) async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(Error::Unauthorized)?;
    state.auth.verify(token).await.ok_or(Error::Unauthorized)
}

/// Count this request against the default quota.
pub(super) async fn enforce_rate_limit(state: &AppState, user_id: &str) -> Result<()> {
    if !state.limiter.check(user_id).await.allowed {
        return Err(Error::TooManyRequests);
    }
    Ok(())
}
