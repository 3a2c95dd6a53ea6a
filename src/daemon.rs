//! Daemon module - main event loop orchestration
//!
//! Wires the hotkey listener, recording controller, model manager, and
//! clipboard sink together and drives them from a single select loop.

use crate::audio::{self, CaptureBuffer};
use crate::config::Config;
use crate::controller::RecordingController;
use crate::engine::TranscriptionEngine;
use crate::error::Result;
use crate::hotkey::{self, HotkeyEvent, HotkeyListener};
use crate::model::ModelManager;
use crate::notify;
use crate::output;
use crate::vad::EnergyVad;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

/// How often the loop checks for a completed hold expiring or a recording
/// hitting the duration cap
const SETTLE_TICK: Duration = Duration::from_millis(250);

/// How often the model manager looks for an idle model to unload
const SWEEP_TICK: Duration = Duration::from_secs(60);

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
    controller: Arc<RecordingController>,
    models: Arc<ModelManager>,
    listener: Box<dyn HotkeyListener>,
}

impl Daemon {
    /// Build the full component stack from configuration
    pub fn new(config: Config) -> Result<Self> {
        if !config.hotkey.enabled {
            return Err(crate::error::VoxclipError::Config(
                "Hotkey listener is disabled ([hotkey] enabled = false); the daemon has no other trigger".to_string(),
            ));
        }

        let listener = hotkey::create_listener(&config.hotkey)?;

        let buffer = Arc::new(CaptureBuffer::new(config.audio.sample_rate));
        let capture = audio::create_capture(&config.audio)?;

        let models = Arc::new(ModelManager::from_config(&config.model));
        let vad = EnergyVad::new(config.model.vad_threshold, config.model.min_silence_ms);
        let engine = Arc::new(TranscriptionEngine::new(Arc::clone(&models), vad));

        let sink = output::create_sink(&config.clipboard);
        let notifier = notify::create_notifier(&config.sounds);

        let controller = Arc::new(RecordingController::new(
            buffer,
            capture,
            engine,
            sink,
            notifier,
            Duration::from_millis(config.completed_hold_ms),
        ));

        Ok(Self {
            config,
            controller,
            models,
            listener,
        })
    }

    /// Run the daemon until a shutdown signal arrives
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            "voxclip daemon starting (hotkey: {}, model: {})",
            self.config.hotkey.combo,
            self.config.model.name
        );

        let mut events = self.listener.start().await?;
        tracing::info!("Hotkey listener active, press {} to record", self.config.hotkey.combo);

        let mut settle_tick = tokio::time::interval(SETTLE_TICK);
        let mut sweep_tick = tokio::time::interval(SWEEP_TICK);
        let mut sigterm = signal(SignalKind::terminate())?;

        let max_duration = self.config.audio.max_duration();

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(HotkeyEvent::Toggle) => {
                            self.controller.toggle().await;
                            discard_stale_events(&mut events);
                        }
                        None => {
                            tracing::error!("Hotkey listener channel closed, shutting down");
                            break;
                        }
                    }
                }

                _ = settle_tick.tick() => {
                    self.controller.maybe_settle();

                    if let Some(duration) = self.controller.state().recording_duration() {
                        if duration >= max_duration {
                            tracing::warn!(
                                "Recording hit the {}s cap, stopping",
                                max_duration.as_secs()
                            );
                            self.controller.toggle().await;
                            discard_stale_events(&mut events);
                        }
                    }
                }

                _ = sweep_tick.tick() => {
                    if self.models.sweep() {
                        tracing::info!("Unloaded idle model");
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down");
                    break;
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.models.begin_shutdown();

        if let Err(e) = self.listener.stop().await {
            tracing::warn!("Error stopping hotkey listener: {}", e);
        }

        tracing::info!("voxclip daemon stopped");
    }
}

/// Throw away hotkey presses that queued up while a toggle was being
/// handled. `toggle()` holds the loop for the length of a transcription,
/// and a press made during that window is ignored, not replayed, so it
/// cannot start an unwanted capture once the state settles back to idle.
fn discard_stale_events(events: &mut tokio::sync::mpsc::Receiver<HotkeyEvent>) -> usize {
    let mut discarded = 0;
    while events.try_recv().is_ok() {
        discarded += 1;
    }
    if discarded > 0 {
        tracing::debug!("Ignored {} hotkey press(es) made while busy", discarded);
    }
    discarded
}
