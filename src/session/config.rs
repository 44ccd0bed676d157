use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Microphone acquisition order between the transcription and raw-audio
/// subsystems. On platforms with first-claimant-wins microphone semantics the
/// transcription engine must claim the device first or the second acquirer is
/// denied access or silently receives no audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MicArbitration {
    #[default]
    TranscriptionFirst,
    AudioFirst,
    Simultaneous,
}

/// Tunables for a recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Who acquires the microphone first.
    pub arbitration: MicArbitration,

    /// Pause between the two microphone acquisitions, letting the first
    /// claimant settle before the second one asks.
    pub settle_delay: Duration,

    /// Cadence of encoded audio chunk emission.
    pub chunk_interval: Duration,

    /// Recognition language tag (e.g. "en-US").
    pub language: String,

    /// Delay before restarting the recognizer after an unsolicited end.
    pub restart_debounce: Duration,

    /// Consecutive failed recognizer restarts tolerated before the session
    /// degrades to not-listening.
    pub max_restart_failures: u32,

    /// Wait after the end-of-stream frame for trailing final results before
    /// the streaming channel is closed.
    pub stop_grace: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            arbitration: MicArbitration::TranscriptionFirst,
            settle_delay: Duration::from_millis(500),
            chunk_interval: Duration::from_millis(250),
            language: "en-US".to_string(),
            restart_debounce: Duration::from_millis(300),
            max_restart_failures: 5,
            stop_grace: Duration::from_millis(500),
        }
    }
}
