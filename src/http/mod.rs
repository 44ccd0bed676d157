//! HTTP API server for note persistence
//!
//! This module provides the REST API the capture core hands its output to:
//! - GET  /notes - List the caller's notes, newest first
//! - POST /notes - Create a note (transcript + optional audio)
//! - PATCH  /notes/:id - Set a note's summary
//! - DELETE /notes/:id - Delete a note and its audio
//! - POST /summarize - Generate a summary for a transcript
//! - GET  /speech/token - Mint a short-lived streaming credential
//! - GET  /health - Health check

mod auth;
mod error;
mod handlers;
mod routes;
mod state;

pub use auth::{AuthVerifier, StaticTokenVerifier};
pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
