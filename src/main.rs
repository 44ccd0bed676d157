use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use voixnotes::http::{create_router, AppState, StaticTokenVerifier};
use voixnotes::notes::{MemoryNoteStore, MemoryObjectStore};
use voixnotes::ratelimit::{RateLimiter, RateQuota};
use voixnotes::upstream::{HttpSpeechKeyMinter, HttpSummarizer};
use voixnotes::Config;

#[derive(Debug, Parser)]
#[command(name = "voixnotes", about = "Voice note API server")]
struct Args {
    /// Configuration file, without extension
    #[arg(long, default_value = "config/voixnotes")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{} starting", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let window = Duration::from_secs(cfg.limits.window_secs);
    let limiter = Arc::new(RateLimiter::new(RateQuota {
        max_requests: cfg.limits.max_requests,
        window,
    }));
    // Periodic sweep keeps the window map bounded.
    Arc::clone(&limiter).spawn_sweeper(Duration::from_secs(300));

    let state = AppState {
        notes: Arc::new(MemoryNoteStore::new()),
        objects: Arc::new(MemoryObjectStore::new(cfg.storage.public_base_url.clone())),
        auth: Arc::new(StaticTokenVerifier::new(cfg.auth.tokens.clone())),
        summarizer: Arc::new(HttpSummarizer::new(
            cfg.summarize.api_base.clone(),
            cfg.summarize.api_key.clone(),
            cfg.summarize.model.clone(),
        )),
        speech_keys: Arc::new(HttpSpeechKeyMinter::new(
            cfg.speech.api_base.clone(),
            cfg.speech.api_key.clone(),
            Duration::from_secs(cfg.speech.key_ttl_secs),
        )),
        limiter,
        summarize_quota: RateQuota {
            max_requests: cfg.limits.summarize_max_requests,
            window,
        },
    };

    let app = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
