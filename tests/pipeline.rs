//! End-to-end pipeline tests with mocked capture, model, and clipboard.
//!
//! These exercise the full toggle cycle through the recording controller:
//! hotkey toggle, capture, voice-activity gate, recognition, normalization,
//! and delivery, without touching real audio devices or model files.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voxclip::audio::{AudioCapture, CaptureBuffer};
use voxclip::controller::RecordingController;
use voxclip::engine::TranscriptionEngine;
use voxclip::error::{AudioError, ModelError, OutputError, TranscribeError};
use voxclip::model::{ModelLoader, ModelManager, SystemClock};
use voxclip::notify::{Notifier, NotifyEvent};
use voxclip::output::TextOutput;
use voxclip::transcribe::{SpeechModel, TranscriptSegment};
use voxclip::vad::EnergyVad;

/// Capture mock that fills the buffer with scripted blocks on start
struct MockCapture {
    blocks: Vec<Vec<f32>>,
    starts: Arc<AtomicUsize>,
    fail_start: bool,
}

impl MockCapture {
    fn with_blocks(blocks: Vec<Vec<f32>>) -> (Self, Arc<AtomicUsize>) {
        let starts = Arc::new(AtomicUsize::new(0));
        (
            Self {
                blocks,
                starts: Arc::clone(&starts),
                fail_start: false,
            },
            starts,
        )
    }

    fn failing() -> Self {
        Self {
            blocks: Vec::new(),
            starts: Arc::new(AtomicUsize::new(0)),
            fail_start: true,
        }
    }
}

#[async_trait::async_trait]
impl AudioCapture for MockCapture {
    async fn start(&mut self, buffer: Arc<CaptureBuffer>) -> Result<(), AudioError> {
        if self.fail_start {
            return Err(AudioError::Device("no such device".to_string()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        for block in &self.blocks {
            buffer.append_f32(block);
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Model that returns fixed segments, optionally parking on a gate first
/// or deleting the artifact to provoke a cleanup failure
struct ScriptedModel {
    segments: Vec<TranscriptSegment>,
    gate: Option<Mutex<std::sync::mpsc::Receiver<()>>>,
    delete_artifact: bool,
}

impl SpeechModel for ScriptedModel {
    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        assert!(audio.exists(), "artifact missing during inference");
        if let Some(gate) = &self.gate {
            gate.lock().unwrap().recv().ok();
        }
        if self.delete_artifact {
            std::fs::remove_file(audio).unwrap();
        }
        Ok(self.segments.clone())
    }
}

struct ScriptedLoader {
    model: Arc<ScriptedModel>,
}

impl ModelLoader for ScriptedLoader {
    fn is_ready(&self, _model: &str) -> bool {
        true
    }

    fn load(&self, _model: &str) -> Result<Arc<dyn SpeechModel>, ModelError> {
        Ok(Arc::clone(&self.model) as Arc<dyn SpeechModel>)
    }
}

/// Notifier that records every event
#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: NotifyEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Clipboard mock that records delivered text
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextOutput for RecordingSink {
    async fn output(&self, text: &str) -> Result<(), OutputError> {
        self.delivered.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn seg(text: &str) -> TranscriptSegment {
    TranscriptSegment {
        text: text.to_string(),
        start_ms: 0,
        end_ms: 1000,
    }
}

/// A second of loud audio as f32 blocks
fn loud_blocks() -> Vec<Vec<f32>> {
    let block: Vec<f32> = (0..1024)
        .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
        .collect();
    vec![block; 16]
}

fn engine_for(model: Arc<ScriptedModel>, vad: EnergyVad) -> (Arc<TranscriptionEngine>, Arc<ModelManager>) {
    let manager = Arc::new(ModelManager::new(
        Arc::new(ScriptedLoader { model }),
        Arc::new(SystemClock),
        "base.en".to_string(),
        Duration::from_secs(300),
    ));
    let engine = Arc::new(TranscriptionEngine::new(Arc::clone(&manager), vad));
    (engine, manager)
}

struct Harness {
    controller: Arc<RecordingController>,
    notifier: Arc<RecordingNotifier>,
    sink: Arc<RecordingSink>,
}

fn harness(capture: Box<dyn AudioCapture>, engine: Arc<TranscriptionEngine>) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let sink = Arc::new(RecordingSink::default());
    let controller = Arc::new(RecordingController::new(
        Arc::new(CaptureBuffer::new(16000)),
        capture,
        engine,
        Arc::clone(&sink) as Arc<dyn TextOutput>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Duration::from_millis(0),
    ));
    Harness {
        controller,
        notifier,
        sink,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn full_cycle_delivers_normalized_text() {
    let model = Arc::new(ScriptedModel {
        segments: vec![seg(" hello world. "), seg("this is a test")],
        gate: None,
        delete_artifact: false,
    });
    let (engine, _) = engine_for(model, EnergyVad::new(0.0, 100));
    let (capture, _) = MockCapture::with_blocks(loud_blocks());
    let h = harness(Box::new(capture), engine);

    h.controller.toggle().await;
    assert!(h.controller.state().is_recording());

    h.controller.toggle().await;
    assert!(h.controller.state().is_completed());
    assert_eq!(h.sink.delivered(), vec!["Hello world. This is a test."]);

    let events = h.notifier.events();
    assert_eq!(
        events,
        vec![NotifyEvent::Start, NotifyEvent::Stop, NotifyEvent::Success]
    );

    // Hold of zero: the next settle tick returns to idle
    h.controller.maybe_settle();
    assert!(h.controller.state().is_idle());
    assert!(h.controller.ready());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_capture_is_benign() {
    let model = Arc::new(ScriptedModel {
        segments: vec![seg("should never run")],
        gate: None,
        delete_artifact: false,
    });
    let (engine, manager) = engine_for(model, EnergyVad::new(0.0, 100));
    let (capture, _) = MockCapture::with_blocks(Vec::new());
    let h = harness(Box::new(capture), engine);

    h.controller.toggle().await;
    h.controller.toggle().await;

    // Straight back to idle, armed, with no error cue and nothing delivered
    assert!(h.controller.state().is_idle());
    assert!(h.controller.ready());
    assert!(h.sink.delivered().is_empty());
    assert!(!h.notifier.events().contains(&NotifyEvent::Error));
    assert!(!manager.is_loaded());
}

#[tokio::test(flavor = "multi_thread")]
async fn silence_skips_recognition_without_error() {
    let model = Arc::new(ScriptedModel {
        segments: vec![seg("should never run")],
        gate: None,
        delete_artifact: false,
    });
    // Demanding gate: near-silent audio must not reach the model
    let (engine, manager) = engine_for(model, EnergyVad::new(0.5, 500));
    let silent_blocks = vec![vec![0.0f32; 1024]; 16];
    let (capture, _) = MockCapture::with_blocks(silent_blocks);
    let h = harness(Box::new(capture), engine);

    h.controller.toggle().await;
    h.controller.toggle().await;

    assert!(h.controller.state().is_idle());
    assert!(h.sink.delivered().is_empty());
    assert!(!h.notifier.events().contains(&NotifyEvent::Error));
    assert!(!manager.is_loaded());
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_during_processing_is_rejected() {
    let (gate_tx, gate_rx) = std::sync::mpsc::channel();
    let model = Arc::new(ScriptedModel {
        segments: vec![seg("slow result")],
        gate: Some(Mutex::new(gate_rx)),
        delete_artifact: false,
    });
    let (engine, _) = engine_for(model, EnergyVad::new(0.0, 100));
    let (capture, starts) = MockCapture::with_blocks(loud_blocks());
    let h = harness(Box::new(capture), engine);

    h.controller.toggle().await;
    assert!(h.controller.state().is_recording());

    // Stop runs on its own task; the model parks on the gate inside it
    let controller = Arc::clone(&h.controller);
    let stop_task = tokio::spawn(async move { controller.toggle().await });

    let mut waited = 0;
    while !h.controller.state().is_processing() {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
        assert!(waited < 500, "never reached processing state");
    }

    // Toggle mid-transcription: no new recording, no state change
    h.controller.toggle().await;
    assert!(h.controller.state().is_processing());
    assert!(!h.controller.ready());
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    gate_tx.send(()).unwrap();
    stop_task.await.unwrap();

    assert!(h.controller.state().is_completed());
    assert_eq!(h.sink.delivered(), vec!["Slow result."]);
    assert!(h.controller.ready());
}

#[tokio::test(flavor = "multi_thread")]
async fn capture_start_failure_recovers_to_idle() {
    let model = Arc::new(ScriptedModel {
        segments: vec![seg("unused")],
        gate: None,
        delete_artifact: false,
    });
    let (engine, _) = engine_for(model, EnergyVad::new(0.0, 100));
    let h = harness(Box::new(MockCapture::failing()), engine);

    h.controller.toggle().await;

    assert!(h.controller.state().is_idle());
    assert!(h.controller.ready());
    assert!(h.notifier.events().contains(&NotifyEvent::Error));
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn second_session_reuses_loaded_model() {
    let model = Arc::new(ScriptedModel {
        segments: vec![seg("again")],
        gate: None,
        delete_artifact: false,
    });
    let (engine, manager) = engine_for(model, EnergyVad::new(0.0, 100));
    let (capture, _) = MockCapture::with_blocks(loud_blocks());
    let h = harness(Box::new(capture), engine);

    h.controller.toggle().await;
    h.controller.toggle().await;
    assert!(manager.is_loaded());

    h.controller.maybe_settle();
    assert!(h.controller.state().is_idle());

    h.controller.toggle().await;
    h.controller.toggle().await;

    assert_eq!(h.sink.delivered(), vec!["Again.", "Again."]);
    assert!(manager.is_loaded());
}

#[tokio::test(flavor = "multi_thread")]
async fn cleanup_failure_flags_error_but_delivers_transcript() {
    let model = Arc::new(ScriptedModel {
        segments: vec![seg("kept anyway")],
        gate: None,
        delete_artifact: true,
    });
    let (engine, _) = engine_for(model, EnergyVad::new(0.0, 100));
    let (capture, _) = MockCapture::with_blocks(loud_blocks());
    let h = harness(Box::new(capture), engine);

    h.controller.toggle().await;
    h.controller.toggle().await;

    // The error cue fires for the failed cleanup, but the transcript is
    // not discarded: delivery still completes the session
    assert!(h.controller.state().is_completed());
    assert_eq!(h.sink.delivered(), vec!["Kept anyway."]);
    assert_eq!(
        h.notifier.events(),
        vec![
            NotifyEvent::Start,
            NotifyEvent::Stop,
            NotifyEvent::Error,
            NotifyEvent::Success
        ]
    );
    assert!(h.controller.ready());
}
