// Synthetic platform backends for exercising the capture core without real
// devices: the coordinator and leaf sessions are driven entirely through
// their trait seams.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use voixnotes::capture::{AudioChunk, CaptureFormat, MicPermission, MicrophoneBackend};
use voixnotes::error::{Error, Result};
use voixnotes::session::{NoteDraft, NoteSink};
use voixnotes::transcribe::{Recognizer, RecognizerEvent, SpeechTokenSource, StreamingChannel};

/// Shared chronological log of observable backend actions.
#[derive(Clone, Default)]
pub struct ActionLog(Arc<Mutex<Vec<String>>>);

impl ActionLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ============================================================================
// Microphone
// ============================================================================

pub struct FakeMicrophone {
    pub permission: MicPermission,
    pub supported_mimes: Vec<&'static str>,
    /// Chunks delivered as soon as capture starts.
    pub chunks: Vec<Vec<u8>>,
    /// `Some(PermissionDenied | DeviceUnavailable)` makes acquisition fail.
    pub fail_start: Option<fn() -> Error>,
    pub log: ActionLog,
    pub capturing: Arc<AtomicBool>,
    chunk_tx: Option<mpsc::Sender<AudioChunk>>,
}

impl FakeMicrophone {
    pub fn new(log: ActionLog) -> Self {
        Self {
            permission: MicPermission::Granted,
            supported_mimes: vec!["audio/webm"],
            chunks: Vec::new(),
            fail_start: None,
            log,
            capturing: Arc::new(AtomicBool::new(false)),
            chunk_tx: None,
        }
    }

    pub fn with_chunks(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn denied(mut self) -> Self {
        self.permission = MicPermission::Denied;
        self
    }

    /// Handle for asserting device release after the backend is boxed away.
    pub fn capturing_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.capturing)
    }
}

#[async_trait]
impl MicrophoneBackend for FakeMicrophone {
    fn permission(&self) -> MicPermission {
        self.permission
    }

    fn is_mime_supported(&self, mime_type: &str) -> bool {
        self.supported_mimes.contains(&mime_type)
    }

    async fn start(&mut self, format: &CaptureFormat) -> Result<mpsc::Receiver<AudioChunk>> {
        self.log.push(format!(
            "audio.start mime={}",
            format.mime_type.as_deref().unwrap_or("default")
        ));
        if let Some(fail) = self.fail_start {
            return Err(fail());
        }

        let (tx, rx) = mpsc::channel(256);
        for data in &self.chunks {
            tx.send(AudioChunk { data: data.clone() })
                .await
                .expect("scripted chunk fits the channel");
        }
        // Keeping the sender holds the stream open until stop releases it.
        self.chunk_tx = Some(tx);
        self.capturing.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.log.push("audio.stop");
        self.chunk_tx = None;
        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "fake-microphone"
    }
}

// ============================================================================
// On-device recognizer
// ============================================================================

/// One scripted engine run, played per `start` call.
pub enum RecognizerRun {
    /// Emit these events, then keep the stream open until stopped.
    Play(Vec<RecognizerEvent>),
    /// Emit these events, then end the stream without being asked to.
    PlayThenEnd(Vec<RecognizerEvent>),
    /// Refuse to start.
    FailStart,
}

pub struct FakeRecognizer {
    pub available: bool,
    runs: Mutex<VecDeque<RecognizerRun>>,
    pub start_calls: Arc<AtomicU32>,
    pub log: ActionLog,
    event_tx: Mutex<Option<mpsc::Sender<RecognizerEvent>>>,
}

impl FakeRecognizer {
    pub fn new(log: ActionLog, runs: Vec<RecognizerRun>) -> Self {
        Self {
            available: true,
            runs: Mutex::new(runs.into()),
            start_calls: Arc::new(AtomicU32::new(0)),
            log,
            event_tx: Mutex::new(None),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn start_call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.start_calls)
    }

    pub fn final_result(text: &str) -> RecognizerEvent {
        RecognizerEvent::Result {
            text: text.to_string(),
            is_final: true,
        }
    }

    pub fn interim_result(text: &str) -> RecognizerEvent {
        RecognizerEvent::Result {
            text: text.to_string(),
            is_final: false,
        }
    }
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push("transcription.start");

        let run = self
            .runs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RecognizerRun::Play(Vec::new()));
        let (tx, rx) = mpsc::channel(256);
        match run {
            RecognizerRun::Play(events) => {
                for event in events {
                    tx.send(event).await.expect("scripted event fits the channel");
                }
                *self.event_tx.lock().unwrap() = Some(tx);
            }
            RecognizerRun::PlayThenEnd(events) => {
                for event in events {
                    tx.send(event).await.expect("scripted event fits the channel");
                }
                tx.send(RecognizerEvent::Ended)
                    .await
                    .expect("scripted event fits the channel");
                // Sender dropped: the stream ends after the scripted events.
            }
            RecognizerRun::FailStart => {
                return Err(Error::DeviceUnavailable("scripted start failure".to_string()));
            }
        }
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.log.push("transcription.stop");
        *self.event_tx.lock().unwrap() = None;
        Ok(())
    }
}

// ============================================================================
// Streaming relay
// ============================================================================

pub struct FakeTokenSource {
    pub token: String,
    pub fail: bool,
    pub issued: Arc<AtomicU32>,
}

impl FakeTokenSource {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            fail: false,
            issued: Arc::new(AtomicU32::new(0)),
        }
    }
}

#[async_trait]
impl SpeechTokenSource for FakeTokenSource {
    async fn issue(&self) -> Result<String> {
        if self.fail {
            return Err(Error::Upstream("scripted token failure".to_string()));
        }
        self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }
}

pub struct FakeStreamingChannel {
    pub log: ActionLog,
    /// Messages delivered as soon as the channel opens.
    pub on_open: Vec<String>,
    /// Messages delivered when the end-of-stream control frame arrives.
    pub on_close_stream: Vec<String>,
    /// Close the channel from the far side right after the opening messages.
    pub drop_after_open: bool,
    pub sent_audio: Arc<Mutex<Vec<Vec<u8>>>>,
    pub sent_controls: Arc<Mutex<Vec<String>>>,
    open_flag: Arc<AtomicBool>,
    message_tx: Option<mpsc::Sender<String>>,
}

impl FakeStreamingChannel {
    pub fn new(log: ActionLog) -> Self {
        Self {
            log,
            on_open: Vec::new(),
            on_close_stream: Vec::new(),
            drop_after_open: false,
            sent_audio: Arc::new(Mutex::new(Vec::new())),
            sent_controls: Arc::new(Mutex::new(Vec::new())),
            open_flag: Arc::new(AtomicBool::new(false)),
            message_tx: None,
        }
    }

    pub fn sent_audio_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.sent_audio)
    }

    pub fn sent_controls_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent_controls)
    }

    /// A finalized relay result message.
    pub fn final_message(text: &str) -> String {
        serde_json::json!({
            "type": "Results",
            "is_final": true,
            "channel": { "alternatives": [{ "transcript": text }] },
        })
        .to_string()
    }

    /// An interim relay result message.
    pub fn interim_message(text: &str) -> String {
        serde_json::json!({
            "type": "Results",
            "is_final": false,
            "channel": { "alternatives": [{ "transcript": text }] },
        })
        .to_string()
    }
}

#[async_trait]
impl StreamingChannel for FakeStreamingChannel {
    async fn open(&mut self, token: &str, language: &str) -> Result<mpsc::Receiver<String>> {
        self.log.push(format!("channel.open token={token} lang={language}"));

        let (tx, rx) = mpsc::channel(256);
        for message in &self.on_open {
            tx.send(message.clone())
                .await
                .expect("scripted message fits the channel");
        }
        if self.drop_after_open {
            // Far-side close: the sender is dropped and the stream ends.
            self.open_flag.store(false, Ordering::SeqCst);
        } else {
            self.message_tx = Some(tx);
            self.open_flag.store(true, Ordering::SeqCst);
        }
        Ok(rx)
    }

    async fn send_audio(&mut self, frame: &[u8]) -> Result<()> {
        if !self.open_flag.load(Ordering::SeqCst) {
            return Err(Error::Upstream("channel closed".to_string()));
        }
        self.sent_audio.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    async fn send_control(&mut self, message: &str) -> Result<()> {
        self.sent_controls.lock().unwrap().push(message.to_string());
        if message.contains("CloseStream") {
            if let Some(tx) = &self.message_tx {
                for trailing in &self.on_close_stream {
                    tx.send(trailing.clone())
                        .await
                        .expect("scripted message fits the channel");
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.push("channel.close");
        self.message_tx = None;
        self.open_flag.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open_flag.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[derive(Clone, Default)]
pub struct MemorySink {
    pub saved: Arc<Mutex<Vec<NoteDraft>>>,
    pub fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            saved: Arc::default(),
            fail: true,
        }
    }

    pub fn drafts(&self) -> Vec<NoteDraft> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteSink for MemorySink {
    async fn save(&self, draft: NoteDraft) -> Result<()> {
        if self.fail {
            return Err(Error::Persistence("scripted save failure".to_string()));
        }
        self.saved.lock().unwrap().push(draft);
        Ok(())
    }
}
