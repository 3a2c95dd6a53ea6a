//! Recording controller
//!
//! Owns the Idle → Recording → Processing → Completed → Idle state machine.
//! `toggle()` is the single entry point: it starts a capture from idle,
//! stops and transcribes from recording, and is rejected (not queued) while
//! a previous session is still processing or holding in completed.
//!
//! `ready_to_record` is a separate gate from the state: it drops when a
//! recording stops and is re-armed only after processing fully settles,
//! including every failure path, so a slow teardown can never admit a new
//! capture.

use crate::audio::{AudioCapture, CaptureBuffer};
use crate::engine::TranscriptionEngine;
use crate::error::AudioError;
use crate::notify::{Notifier, NotifyEvent};
use crate::output::TextOutput;
use crate::state::AppState;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

enum Action {
    Start(u64),
    Stop(u64),
    Ignore,
}

/// State machine driving capture and transcription
pub struct RecordingController {
    state: Mutex<AppState>,
    ready_to_record: AtomicBool,
    session_seq: AtomicU64,
    buffer: Arc<CaptureBuffer>,
    capture: tokio::sync::Mutex<Box<dyn AudioCapture>>,
    engine: Arc<TranscriptionEngine>,
    sink: Arc<dyn TextOutput>,
    notifier: Arc<dyn Notifier>,
    completed_hold: Duration,
}

impl RecordingController {
    pub fn new(
        buffer: Arc<CaptureBuffer>,
        capture: Box<dyn AudioCapture>,
        engine: Arc<TranscriptionEngine>,
        sink: Arc<dyn TextOutput>,
        notifier: Arc<dyn Notifier>,
        completed_hold: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(AppState::Idle),
            ready_to_record: AtomicBool::new(true),
            session_seq: AtomicU64::new(0),
            buffer,
            capture: tokio::sync::Mutex::new(capture),
            engine,
            sink,
            notifier,
            completed_hold,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AppState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether a new recording would currently be admitted
    pub fn ready(&self) -> bool {
        self.ready_to_record.load(Ordering::SeqCst)
    }

    /// Handle a hotkey press: start from idle, stop from recording,
    /// otherwise ignore.
    pub async fn toggle(&self) {
        let action = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match &*state {
                AppState::Idle => {
                    if !self.ready_to_record.load(Ordering::SeqCst) {
                        tracing::debug!("Toggle ignored: previous session still tearing down");
                        Action::Ignore
                    } else {
                        let session = self.session_seq.fetch_add(1, Ordering::SeqCst) + 1;
                        *state = AppState::Recording {
                            started_at: Instant::now(),
                            session,
                        };
                        Action::Start(session)
                    }
                }
                AppState::Recording { session, .. } => {
                    let session = *session;
                    // Gate drops here; re-armed when processing settles
                    self.ready_to_record.store(false, Ordering::SeqCst);
                    *state = AppState::Processing { session };
                    Action::Stop(session)
                }
                AppState::Processing { .. } => {
                    tracing::debug!("Toggle ignored: transcription in progress");
                    Action::Ignore
                }
                AppState::Completed { .. } => {
                    tracing::debug!("Toggle ignored: completed hold active");
                    Action::Ignore
                }
            }
        };

        match action {
            Action::Start(session) => self.start_recording(session).await,
            Action::Stop(session) => self.stop_and_process(session).await,
            Action::Ignore => {}
        }
    }

    async fn start_recording(&self, session: u64) {
        self.buffer.reset();

        let result = {
            let mut capture = self.capture.lock().await;
            capture.start(Arc::clone(&self.buffer)).await
        };

        match result {
            Ok(()) => {
                tracing::info!("Recording started (session {})", session);
                self.notifier.notify(NotifyEvent::Start);
            }
            Err(e) => {
                tracing::error!("Failed to start audio capture: {}", e);
                self.notifier.notify(NotifyEvent::Error);
                self.set_idle();
            }
        }
    }

    async fn stop_and_process(&self, session: u64) {
        let stop_result = {
            let mut capture = self.capture.lock().await;
            capture.stop().await
        };

        if let Err(e) = stop_result {
            // Keep going: blocks captured before the error are still valid
            tracing::warn!("Error closing audio stream: {}", e);
        }

        self.notifier.notify(NotifyEvent::Stop);

        let utterance = match self.buffer.drain() {
            Ok(utterance) => utterance,
            Err(AudioError::EmptyBuffer) => {
                // Benign: the device produced no callbacks before stop
                tracing::info!("Nothing captured in session {}, skipping", session);
                self.settle_idle();
                return;
            }
            Err(e) => {
                tracing::error!("Failed to drain capture buffer: {}", e);
                self.notifier.notify(NotifyEvent::Error);
                self.settle_idle();
                return;
            }
        };

        tracing::info!(
            "Transcribing {:.1}s of audio (session {})",
            utterance.duration_secs(),
            session
        );

        let engine = Arc::clone(&self.engine);
        let result = tokio::task::spawn_blocking(move || engine.transcribe(&utterance)).await;

        match result {
            Ok(Ok(outcome)) => {
                if outcome.artifact_cleanup_failed {
                    self.notifier.notify(NotifyEvent::Error);
                }

                match outcome.text {
                    Some(text) => self.deliver(&text).await,
                    None => {
                        // No speech is a normal outcome, not an error
                        tracing::info!("No speech detected in session {}", session);
                        self.set_idle();
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Transcription failed: {}", e);
                self.notifier.notify(NotifyEvent::Error);
                self.set_idle();
            }
            Err(e) => {
                tracing::error!("Transcription task panicked: {}", e);
                self.notifier.notify(NotifyEvent::Error);
                self.set_idle();
            }
        }

        // Gate re-arms after every processing path, success or failure
        self.ready_to_record.store(true, Ordering::SeqCst);
    }

    async fn deliver(&self, text: &str) {
        tracing::info!("Transcribed: {:?}", text);

        match self.sink.output(text).await {
            Ok(()) => {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                *state = AppState::Completed {
                    finished_at: Instant::now(),
                };
                self.notifier.notify(NotifyEvent::Success);
            }
            Err(e) => {
                tracing::error!("Failed to deliver transcript: {}", e);
                self.notifier.notify(NotifyEvent::Error);
                self.set_idle();
            }
        }
    }

    /// Move a completed session back to idle once the hold has elapsed.
    /// Driven by the daemon's periodic tick.
    pub fn maybe_settle(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let AppState::Completed { finished_at } = *state {
            if finished_at.elapsed() >= self.completed_hold {
                *state = AppState::Idle;
            }
        }
    }

    fn set_idle(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = AppState::Idle;
    }

    /// Return to idle and re-arm the gate (early exits from processing)
    fn settle_idle(&self) {
        self.set_idle();
        self.ready_to_record.store(true, Ordering::SeqCst);
    }
}
