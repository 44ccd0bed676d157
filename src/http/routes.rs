use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Notes CRUD
        .route("/notes", get(handlers::list_notes).post(handlers::create_note))
        .route(
            "/notes/:note_id",
            patch(handlers::update_note).delete(handlers::delete_note),
        )
        // Summarization
        .route("/summarize", post(handlers::summarize))
        // Short-lived streaming credential
        .route("/speech/token", get(handlers::speech_token))
        // Browser clients live on another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
