use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::config::{CaptureSettings, MicArbitration};
use crate::capture::{AudioBlob, AudioCaptureSession};
use crate::error::Result;
use crate::transcribe::{TranscriptEvent, TranscriptSnapshot, TranscriptionSession};

/// Lifecycle of the combined recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Acquiring,
    Recording,
    Stopping,
}

/// Events surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    State(SessionState),
    /// Elapsed whole seconds, once per second while recording and once more
    /// with the final duration on stop.
    DurationTick(u64),
    Transcript(TranscriptEvent),
}

/// What a finished recording hands to persistence.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub transcript: String,
    pub audio: Option<AudioBlob>,
    pub duration_seconds: u64,
}

/// Persistence collaborator receiving finished drafts.
#[async_trait]
pub trait NoteSink: Send + Sync {
    async fn save(&self, draft: NoteDraft) -> Result<()>;
}

/// Owns the combined lifecycle of audio capture and live transcription.
///
/// Arbitrates microphone acquisition order between the two leaves, merges
/// finalized and trailing interim text into the note transcript, and exposes
/// one consolidated start/stop/error contract. At most one session is active;
/// redundant `start`/`stop` calls are no-ops.
pub struct RecordingCoordinator {
    settings: CaptureSettings,
    capture: AudioCaptureSession,
    transcription: Box<dyn TranscriptionSession>,
    sink: Arc<dyn NoteSink>,
    state: SessionState,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    forward_tasks: Vec<JoinHandle<()>>,
}

impl RecordingCoordinator {
    pub fn new(
        capture: AudioCaptureSession,
        transcription: Box<dyn TranscriptionSession>,
        sink: Arc<dyn NoteSink>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            settings,
            capture,
            transcription,
            sink,
            state: SessionState::Idle,
            events: None,
            forward_tasks: Vec::new(),
        }
    }

    /// Subscribe the UI layer. Replaces any previous subscription.
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current transcript, for display while recording.
    pub async fn transcript(&self) -> TranscriptSnapshot {
        self.transcription.snapshot().await
    }

    /// Start a recording session. A no-op unless idle.
    ///
    /// Acquisition runs to completion: there is no mid-acquisition cancel,
    /// and any leaf failure aborts the whole attempt, releases whatever was
    /// already acquired, and surfaces a single error that distinguishes a
    /// denied permission from a generic device failure.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            warn!("start ignored, session is {:?}", self.state);
            return Ok(());
        }
        self.set_state(SessionState::Acquiring);

        if let Err(e) = self.acquire().await {
            warn!("acquisition failed: {e}");
            self.release().await;
            self.set_state(SessionState::Idle);
            return Err(e);
        }

        self.spawn_duration_forwarder();
        self.set_state(SessionState::Recording);
        Ok(())
    }

    /// Stop the active session, persisting the note when there is anything
    /// to persist. A no-op unless recording; the second of two consecutive
    /// stops returns `Ok(None)`.
    pub async fn stop(&mut self) -> Result<Option<NoteDraft>> {
        if self.state != SessionState::Recording {
            debug!("stop ignored, session is {:?}", self.state);
            return Ok(None);
        }
        self.set_state(SessionState::Stopping);

        // Transcription first, so trailing recognized text is flushed before
        // the recorder finalizes.
        let transcript = match self.transcription.stop().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("transcription did not stop cleanly: {e}");
                self.transcription.snapshot().await
            }
        };
        let outcome = self.capture.stop().await;

        let merged = transcript.merged();
        let draft = if merged.is_empty() {
            debug!("discarding recording with empty transcript");
            None
        } else {
            Some(NoteDraft {
                transcript: merged,
                audio: outcome.audio,
                duration_seconds: outcome.duration_secs,
            })
        };

        let saved = match &draft {
            Some(draft) => self.sink.save(draft.clone()).await,
            None => Ok(()),
        };

        // Buffers are reset whatever happened above.
        if let Err(e) = self.transcription.reset().await {
            warn!("transcript reset failed: {e}");
        }
        self.abort_forwarders();
        self.set_state(SessionState::Idle);

        saved.map(|_| draft)
    }

    async fn acquire(&mut self) -> Result<()> {
        let transcript_events = self.transcript_forwarder();

        if !self.transcription.is_supported() {
            debug!("live transcription unsupported, acquiring audio only");
            self.capture.start(None).await?;
            return Ok(());
        }

        match self.settings.arbitration {
            MicArbitration::TranscriptionFirst => {
                self.transcription.start(transcript_events).await?;
                sleep(self.settings.settle_delay).await;
                self.capture.start(self.transcription.chunk_sink()).await?;
            }
            MicArbitration::AudioFirst => {
                self.capture.start(self.transcription.chunk_sink()).await?;
                sleep(self.settings.settle_delay).await;
                self.transcription.start(transcript_events).await?;
            }
            MicArbitration::Simultaneous => {
                let sink = self.transcription.chunk_sink();
                let Self {
                    transcription,
                    capture,
                    ..
                } = self;
                let (t, a) = tokio::join!(transcription.start(transcript_events), capture.start(sink));
                t?;
                a?;
            }
        }
        Ok(())
    }

    /// Release whatever a failed acquisition left behind; both leaf stops
    /// are harmless when the leaf never acquired.
    async fn release(&mut self) {
        if let Err(e) = self.transcription.stop().await {
            warn!("release: transcription stop failed: {e}");
        }
        let _ = self.capture.stop().await;
        if let Err(e) = self.transcription.reset().await {
            warn!("release: transcript reset failed: {e}");
        }
        self.abort_forwarders();
    }

    fn set_state(&mut self, state: SessionState) {
        info!("recording session {:?} -> {:?}", self.state, state);
        self.state = state;
        if let Some(events) = &self.events {
            let _ = events.send(SessionEvent::State(state));
        }
    }

    /// Adapter feeding leaf transcript events into the UI event stream.
    fn transcript_forwarder(&mut self) -> Option<mpsc::UnboundedSender<TranscriptEvent>> {
        let events = self.events.clone()?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.forward_tasks.push(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let _ = events.send(SessionEvent::Transcript(event));
            }
        }));
        Some(tx)
    }

    fn spawn_duration_forwarder(&mut self) {
        let Some(events) = self.events.clone() else {
            return;
        };
        let mut duration_rx = self.capture.duration_updates();
        self.forward_tasks.push(tokio::spawn(async move {
            while duration_rx.changed().await.is_ok() {
                let secs = *duration_rx.borrow_and_update();
                let _ = events.send(SessionEvent::DurationTick(secs));
            }
        }));
    }

    fn abort_forwarders(&mut self) {
        for task in self.forward_tasks.drain(..) {
            task.abort();
        }
    }
}
