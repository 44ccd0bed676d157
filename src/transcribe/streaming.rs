use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{emit, TranscriptBuffer, TranscriptEvent, TranscriptSnapshot, TranscriptionSession};
use crate::capture::AudioChunk;
use crate::error::{Error, Result};
use crate::session::CaptureSettings;

/// Message type tag carried by transcript results; everything else on the
/// channel (metadata, keepalives) is ignored without error.
const RESULTS_TYPE: &str = "Results";

/// End-of-stream control frame asking the relay to flush trailing finals.
const CLOSE_STREAM: &str = r#"{"type":"CloseStream"}"#;

/// Client-side exchange for the short-lived streaming credential, minted per
/// recording session. The long-lived service key never reaches this layer.
#[async_trait]
pub trait SpeechTokenSource: Send + Sync {
    async fn issue(&self) -> Result<String>;
}

/// Bidirectional transcription transport seam (a WebSocket in a browser
/// shell). `open` authenticates with the session credential and yields the
/// inbound message stream; `close` tears the channel down and ends it.
#[async_trait]
pub trait StreamingChannel: Send {
    async fn open(&mut self, token: &str, language: &str) -> Result<mpsc::Receiver<String>>;

    /// Forward one encoded audio chunk as a binary frame.
    async fn send_audio(&mut self, frame: &[u8]) -> Result<()>;

    /// Send a textual control frame.
    async fn send_control(&mut self, message: &str) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct RelayMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    is_final: bool,
    channel: Option<RelayChannel>,
}

#[derive(Debug, Deserialize)]
struct RelayChannel {
    alternatives: Vec<RelayAlternative>,
}

#[derive(Debug, Deserialize)]
struct RelayAlternative {
    transcript: String,
}

/// Transcription session backed by a server-relayed streaming channel.
///
/// Audio chunks arrive through `chunk_sink` and are forwarded as binary
/// frames while the channel is open; chunks hitting a closed channel are
/// dropped silently, the recording is unaffected. Stopping sends the
/// end-of-stream frame and waits a grace delay so a trailing final result is
/// not lost to an abrupt teardown.
pub struct StreamingSession {
    tokens: Arc<dyn SpeechTokenSource>,
    channel: Arc<Mutex<Box<dyn StreamingChannel>>>,
    buffer: Arc<Mutex<TranscriptBuffer>>,
    listening: Arc<AtomicBool>,
    language: String,
    stop_grace: Duration,
    chunk_tx: mpsc::UnboundedSender<AudioChunk>,
    chunk_rx: Option<mpsc::UnboundedReceiver<AudioChunk>>,
    pump_task: Option<JoinHandle<()>>,
    forward_task: Option<JoinHandle<()>>,
}

impl StreamingSession {
    pub fn new(
        tokens: Arc<dyn SpeechTokenSource>,
        channel: Box<dyn StreamingChannel>,
        settings: &CaptureSettings,
    ) -> Self {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        Self {
            tokens,
            channel: Arc::new(Mutex::new(channel)),
            buffer: Arc::new(Mutex::new(TranscriptBuffer::default())),
            listening: Arc::new(AtomicBool::new(false)),
            language: settings.language.clone(),
            stop_grace: settings.stop_grace,
            chunk_tx,
            chunk_rx: Some(chunk_rx),
            pump_task: None,
            forward_task: None,
        }
    }
}

#[async_trait]
impl TranscriptionSession for StreamingSession {
    fn is_supported(&self) -> bool {
        true
    }

    async fn start(
        &mut self,
        events: Option<mpsc::UnboundedSender<TranscriptEvent>>,
    ) -> Result<()> {
        if self.listening.load(Ordering::SeqCst) {
            warn!("streaming session already listening");
            return Ok(());
        }

        let token = self.tokens.issue().await?;
        let mut message_rx = self.channel.lock().await.open(&token, &self.language).await?;
        self.listening.store(true, Ordering::SeqCst);
        info!("streaming transcription channel open");

        let buffer = Arc::clone(&self.buffer);
        let listening = Arc::clone(&self.listening);
        self.pump_task = Some(tokio::spawn(async move {
            while let Some(raw) = message_rx.recv().await {
                let message: RelayMessage = match serde_json::from_str(&raw) {
                    Ok(message) => message,
                    Err(_) => continue,
                };
                if message.kind != RESULTS_TYPE {
                    continue;
                }
                let text = message
                    .channel
                    .and_then(|c| c.alternatives.into_iter().next())
                    .map(|a| a.transcript)
                    .unwrap_or_default();
                if text.is_empty() {
                    continue;
                }

                let mut buf = buffer.lock().await;
                if message.is_final {
                    buf.commit_final(&text);
                    drop(buf);
                    emit(&events, TranscriptEvent::FinalDelta(text));
                } else {
                    buf.replace_interim(&text);
                    drop(buf);
                    emit(&events, TranscriptEvent::InterimReplace(text));
                }
            }

            // Unsolicited closes degrade the session; an explicit stop has
            // already cleared the listening flag by the time the stream ends.
            if listening.swap(false, Ordering::SeqCst) {
                warn!("streaming transcription channel closed unexpectedly");
                emit(
                    &events,
                    TranscriptEvent::Degraded("transcription channel closed".to_string()),
                );
            }
            emit(&events, TranscriptEvent::Ended);
        }));

        let mut chunk_rx = match self.chunk_rx.take() {
            Some(rx) => rx,
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                self.chunk_tx = tx;
                rx
            }
        };
        let channel = Arc::clone(&self.channel);
        self.forward_task = Some(tokio::spawn(async move {
            while let Some(chunk) = chunk_rx.recv().await {
                let mut ch = channel.lock().await;
                if !ch.is_open() {
                    continue;
                }
                if let Err(e) = ch.send_audio(&chunk.data).await {
                    debug!("dropping audio frame, channel unavailable: {e}");
                }
            }
        }));

        Ok(())
    }

    async fn stop(&mut self) -> Result<TranscriptSnapshot> {
        if self.pump_task.is_some() {
            // Ask the relay to flush, then give a trailing final result time
            // to arrive before tearing the channel down.
            {
                let mut ch = self.channel.lock().await;
                if ch.is_open() {
                    if let Err(e) = ch.send_control(CLOSE_STREAM).await {
                        debug!("end-of-stream frame not delivered: {e}");
                    }
                }
            }
            sleep(self.stop_grace).await;

            self.listening.store(false, Ordering::SeqCst);
            if let Err(e) = self.channel.lock().await.close().await {
                warn!("failed to close transcription channel: {e}");
            }
            if let Some(pump) = self.pump_task.take() {
                if let Err(e) = pump.await {
                    warn!("streaming pump task panicked: {e}");
                }
            }
            if let Some(forward) = self.forward_task.take() {
                forward.abort();
            }

            // Fresh chunk plumbing for the next session.
            let (tx, rx) = mpsc::unbounded_channel();
            self.chunk_tx = tx;
            self.chunk_rx = Some(rx);
            info!("streaming session stopped");
        }

        let mut buffer = self.buffer.lock().await;
        let snapshot = buffer.snapshot();
        buffer.clear_interim();
        Ok(snapshot)
    }

    async fn reset(&mut self) -> Result<()> {
        if self.listening.load(Ordering::SeqCst) {
            return Err(Error::Validation(
                "cannot reset an active transcription session".to_string(),
            ));
        }
        self.buffer.lock().await.reset();
        Ok(())
    }

    async fn snapshot(&self) -> TranscriptSnapshot {
        self.buffer.lock().await.snapshot()
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn chunk_sink(&self) -> Option<mpsc::UnboundedSender<AudioChunk>> {
        Some(self.chunk_tx.clone())
    }
}
