use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{emit, TranscriptBuffer, TranscriptEvent, TranscriptSnapshot, TranscriptionSession};
use crate::capture::AudioChunk;
use crate::error::{Error, Result};
use crate::session::CaptureSettings;

/// Error kind continuous engines raise during silence; tolerated without
/// degrading the session.
const NO_SPEECH: &str = "no-speech";

/// On-device speech recognition seam (continuous, interim-enabled,
/// language-pinned by the platform shell).
///
/// Each `start` yields a fresh event stream. The stream ends when the engine
/// stops — whether or not anyone asked it to: constrained platforms silently
/// end a continuous session after a pause in speech.
#[async_trait]
pub trait Recognizer: Send {
    /// Whether the platform offers speech recognition at all.
    fn is_available(&self) -> bool;

    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>>;

    async fn stop(&mut self) -> Result<()>;
}

/// Raw engine events, delivered in arrival order.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    Result { text: String, is_final: bool },
    Error { kind: String },
    Ended,
}

/// Transcription session backed by an on-device recognizer.
///
/// Restart handling: an unsolicited end while logically listening triggers a
/// debounced restart. Consecutive restart failures are bounded; hitting the
/// cutoff degrades the session to not-listening while recording continues.
pub struct RecognizerSession {
    recognizer: Arc<Mutex<Box<dyn Recognizer>>>,
    buffer: Arc<Mutex<TranscriptBuffer>>,
    listening: Arc<AtomicBool>,
    restart_debounce: Duration,
    max_restart_failures: u32,
    supported: bool,
    task: Option<JoinHandle<()>>,
}

impl RecognizerSession {
    pub fn new(recognizer: Box<dyn Recognizer>, settings: &CaptureSettings) -> Self {
        let supported = recognizer.is_available();
        Self {
            recognizer: Arc::new(Mutex::new(recognizer)),
            buffer: Arc::new(Mutex::new(TranscriptBuffer::default())),
            listening: Arc::new(AtomicBool::new(false)),
            restart_debounce: settings.restart_debounce,
            max_restart_failures: settings.max_restart_failures,
            supported,
            task: None,
        }
    }
}

#[async_trait]
impl TranscriptionSession for RecognizerSession {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn start(
        &mut self,
        events: Option<mpsc::UnboundedSender<TranscriptEvent>>,
    ) -> Result<()> {
        if self.listening.load(Ordering::SeqCst) {
            warn!("recognizer session already listening");
            return Ok(());
        }
        if !self.supported {
            return Err(Error::DeviceUnavailable(
                "speech recognition is not available on this platform".to_string(),
            ));
        }

        let mut event_rx = self.recognizer.lock().await.start().await?;
        self.listening.store(true, Ordering::SeqCst);
        info!("recognizer session started");

        let recognizer = Arc::clone(&self.recognizer);
        let buffer = Arc::clone(&self.buffer);
        let listening = Arc::clone(&self.listening);
        let debounce = self.restart_debounce;
        let max_failures = self.max_restart_failures;

        self.task = Some(tokio::spawn(async move {
            let mut consecutive_failures: u32 = 0;
            'session: loop {
                while let Some(event) = event_rx.recv().await {
                    match event {
                        RecognizerEvent::Result { text, is_final } => {
                            let mut buf = buffer.lock().await;
                            if is_final {
                                buf.commit_final(&text);
                                drop(buf);
                                emit(&events, TranscriptEvent::FinalDelta(text));
                            } else {
                                buf.replace_interim(&text);
                                drop(buf);
                                emit(&events, TranscriptEvent::InterimReplace(text));
                            }
                        }
                        RecognizerEvent::Error { kind } => {
                            if kind == NO_SPEECH {
                                debug!("recognizer reported no speech");
                            } else {
                                warn!("recognizer error: {kind}");
                                listening.store(false, Ordering::SeqCst);
                                emit(
                                    &events,
                                    TranscriptEvent::Degraded(format!(
                                        "speech recognition error: {kind}"
                                    )),
                                );
                            }
                        }
                        RecognizerEvent::Ended => break,
                    }
                }

                // The engine stream ended. Restart only if still logically
                // listening, after a debounce that prevents restart storms.
                if !listening.load(Ordering::SeqCst) {
                    break 'session;
                }
                sleep(debounce).await;
                if !listening.load(Ordering::SeqCst) {
                    break 'session;
                }

                let mut engine = recognizer.lock().await;
                // A stop may have won the lock while we were debouncing.
                if !listening.load(Ordering::SeqCst) {
                    break 'session;
                }
                match engine.start().await {
                    Ok(new_rx) => {
                        consecutive_failures = 0;
                        event_rx = new_rx;
                        info!("recognizer restarted after unsolicited end");
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        warn!(
                            "recognizer restart failed ({consecutive_failures}/{max_failures}): {e}"
                        );
                        if consecutive_failures >= max_failures {
                            listening.store(false, Ordering::SeqCst);
                            emit(
                                &events,
                                TranscriptEvent::Degraded(
                                    "live transcription unavailable".to_string(),
                                ),
                            );
                            break 'session;
                        }
                    }
                }
            }
            emit(&events, TranscriptEvent::Ended);
        }));

        Ok(())
    }

    async fn stop(&mut self) -> Result<TranscriptSnapshot> {
        self.listening.store(false, Ordering::SeqCst);

        // The engine is stopped even when the session already degraded: a
        // degraded engine may still be running and holding the device.
        if let Some(task) = self.task.take() {
            if let Err(e) = self.recognizer.lock().await.stop().await {
                warn!("recognizer stop failed: {e}");
            }
            if let Err(e) = task.await {
                warn!("recognizer session task panicked: {e}");
            }
            info!("recognizer session stopped");
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
        None
    }
}
