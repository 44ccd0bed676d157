use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub limits: LimitsConfig,
    pub storage: StorageConfig,
    pub speech: SpeechConfig,
    pub summarize: SummarizeConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    /// Rate-limit window in seconds.
    pub window_secs: u64,
    /// Requests allowed per window for mutating note routes.
    pub max_requests: u32,
    /// Tighter allowance for the summarization endpoint.
    pub summarize_max_requests: u32,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Base URL public audio object URLs are derived from.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    pub api_base: String,
    pub api_key: String,
    /// TTL of minted streaming credentials, in seconds.
    pub key_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Bearer token -> user id, for development deployments.
    pub tokens: HashMap<String, String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            // Secrets are usually injected as VOIXNOTES_SPEECH__API_KEY etc.
            .add_source(config::Environment::with_prefix("VOIXNOTES").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
