use thiserror::Error;

/// Failure classes surfaced across the capture core and the HTTP API.
///
/// Client-leaf hiccups (a failed recognizer restart, an audio frame sent to a
/// closed channel) are deliberately NOT represented here: those are recovered
/// locally and reported as degradation events, because the audio recording is
/// the primary artifact and must survive transcription loss.
#[derive(Debug, Error)]
pub enum Error {
    /// The microphone permission was denied by the user or platform.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The audio device could not be acquired for any other reason.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("too many requests")]
    TooManyRequests,

    /// Missing or invalid caller input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A third-party service call failed.
    #[error("upstream service failure: {0}")]
    Upstream(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, Error>;
