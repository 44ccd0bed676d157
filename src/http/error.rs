use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;

use crate::error::Error;

/// JSON error body returned to callers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps the crate error taxonomy onto HTTP statuses. Internal detail is
/// logged in full and never returned to the caller.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Error::TooManyRequests => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests".to_string())
            }
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::Upstream(detail) => {
                error!("upstream failure: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Upstream service failed".to_string(),
                )
            }
            Error::Persistence(detail) => {
                error!("persistence failure: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
            other => {
                error!("unexpected error in handler: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
