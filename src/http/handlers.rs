use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::auth;
use super::error::ApiError;
use super::state::AppState;
use crate::error::Error;
use crate::notes::{NewNote, Note, ObjectStore};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub transcript: String,

    #[serde(default)]
    pub duration_seconds: u64,

    /// Base64-encoded audio, when the client captured any.
    pub audio_base64: Option<String>,

    /// Encoding of the audio payload (default: audio/webm).
    pub audio_mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    #[serde(flatten)]
    pub note: Note,
    /// Public playback URL, when the note has audio.
    pub audio_url: Option<String>,
}

impl NoteResponse {
    fn new(note: Note, objects: &dyn ObjectStore) -> Self {
        let audio_url = note.audio_path.as_deref().map(|path| objects.public_url(path));
        Self { note, audio_url }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    /// The only field mutable after creation.
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub transcript: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct SpeechTokenResponse {
    pub key: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /notes
/// All notes for the authenticated user, newest first.
pub async fn list_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = auth::authenticate(&state, &headers).await?;
    auth::enforce_rate_limit(&state, &user_id).await?;

    let notes = state.notes.list(&user_id).await?;
    let body: Vec<NoteResponse> = notes
        .into_iter()
        .map(|note| NoteResponse::new(note, state.objects.as_ref()))
        .collect();
    Ok(Json(body).into_response())
}

/// POST /notes
/// Create a note with its transcript and optional audio.
pub async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateNoteRequest>,
) -> Result<Response, ApiError> {
    let user_id = auth::authenticate(&state, &headers).await?;
    auth::enforce_rate_limit(&state, &user_id).await?;

    let transcript = request.transcript.trim();
    if transcript.is_empty() {
        return Err(Error::Validation("Missing transcript".to_string()).into());
    }

    let mut audio_path = None;
    if let Some(encoded) = request.audio_base64.as_deref().filter(|s| !s.is_empty()) {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| Error::Validation("Invalid audio encoding".to_string()))?;
        if !data.is_empty() {
            let mime_type = request.audio_mime_type.as_deref().unwrap_or("audio/webm");
            let path = format!("{}/{}.{}", user_id, Uuid::new_v4(), extension_for(mime_type));
            // Upload is best-effort: the transcript is the primary artifact
            // and the note is created either way.
            match state.objects.put(&path, data, mime_type).await {
                Ok(()) => audio_path = Some(path),
                Err(e) => error!("failed to upload audio: {e}"),
            }
        }
    }

    let note = state
        .notes
        .insert(NewNote {
            user_id,
            transcript: transcript.to_string(),
            audio_path,
            duration_seconds: request.duration_seconds,
        })
        .await?;

    info!("note {} created ({}s)", note.id, note.duration_seconds);
    let body = NoteResponse::new(note, state.objects.as_ref());
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// PATCH /notes/:note_id
/// Update a note; only the summary is writable.
pub async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Response, ApiError> {
    let user_id = auth::authenticate(&state, &headers).await?;
    auth::enforce_rate_limit(&state, &user_id).await?;

    let Some(summary) = request.summary else {
        return Err(Error::Validation("No valid updates".to_string()).into());
    };

    if state.notes.set_summary(&user_id, note_id, &summary).await? {
        Ok(Json(OkResponse { ok: true }).into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(super::error::ErrorResponse {
                error: "Note not found".to_string(),
            }),
        )
            .into_response())
    }
}

/// DELETE /notes/:note_id
/// Delete a note and its stored audio. Idempotent.
pub async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = auth::authenticate(&state, &headers).await?;
    auth::enforce_rate_limit(&state, &user_id).await?;

    // Remove the stored audio before the record so a failed record delete
    // cannot leave an unreferenced, unfindable blob. Best-effort: a dangling
    // object must not block the record deletion.
    if let Some(note) = state.notes.get(&user_id, note_id).await? {
        if let Some(path) = &note.audio_path {
            if let Err(e) = state.objects.remove(path).await {
                warn!("failed to remove audio object {path}: {e}");
            }
        }
    }

    state.notes.remove(&user_id, note_id).await?;
    Ok(Json(OkResponse { ok: true }).into_response())
}

/// POST /summarize
/// Generate a summary for a transcript.
pub async fn summarize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SummarizeRequest>,
) -> Result<Response, ApiError> {
    let user_id = auth::authenticate(&state, &headers).await?;
    let decision = state
        .limiter
        .check_with(&format!("summarize:{user_id}"), state.summarize_quota)
        .await;
    if !decision.allowed {
        return Err(Error::TooManyRequests.into());
    }

    let transcript = request.transcript.unwrap_or_default();
    if transcript.trim().is_empty() {
        return Err(Error::Validation("Missing transcript".to_string()).into());
    }

    let summary = state.summarizer.summarize(&transcript).await?;
    Ok(Json(SummarizeResponse { summary }).into_response())
}

/// GET /speech/token
/// Mint a short-lived streaming credential for the calling session.
pub async fn speech_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    auth::authenticate(&state, &headers).await?;

    let key = state.speech_keys.mint().await?;
    Ok(Json(SpeechTokenResponse { key }).into_response())
}

/// GET /health
/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// File extension for a negotiated audio encoding.
fn extension_for(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().unwrap_or_default() {
        "audio/mp4" => "m4a",
        "audio/ogg" => "ogg",
        _ => "webm",
    }
}
