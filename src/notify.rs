//! Sound-cue notifications
//!
//! Plays short audio cues for recording events. Sounds are generated
//! programmatically so no binary assets ship with the crate. Playback is
//! fire-and-forget and never blocks the caller; failures are logged only.
//!
//! rodio's output stream is not Send, so it lives on a dedicated playback
//! thread fed through a channel, mirroring how the capture stream is run.

use crate::config::SoundConfig;
use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notification events emitted by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    /// Recording started
    Start,
    /// Recording stopped, transcription beginning
    Stop,
    /// Transcript delivered to the clipboard
    Success,
    /// Something went wrong
    Error,
}

/// Trait for notification sinks
pub trait Notifier: Send + Sync {
    fn notify(&self, event: NotifyEvent);
}

/// Notifier that does nothing (sounds disabled)
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: NotifyEvent) {}
}

/// Audio cue player backed by rodio.
///
/// Holds only the channel sender; the output stream and decoded cues live
/// on the playback thread. The thread exits when the last sender drops.
pub struct AudioNotifier {
    tx: mpsc::UnboundedSender<NotifyEvent>,
}

impl AudioNotifier {
    pub fn new(config: &SoundConfig) -> Result<Self, String> {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotifyEvent>();
        let (init_tx, init_rx) = std::sync::mpsc::channel::<Result<(), String>>();
        let volume = config.volume;

        std::thread::Builder::new()
            .name("sound-cues".to_string())
            .spawn(move || {
                let (stream, stream_handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = init_tx.send(Err(format!("Failed to open audio output: {}", e)));
                        return;
                    }
                };
                // Keep the stream alive for the thread's lifetime
                let _stream = stream;

                let sounds = generate_cues();
                let _ = init_tx.send(Ok(()));

                while let Some(event) = rx.blocking_recv() {
                    let data = match event {
                        NotifyEvent::Start => &sounds.start,
                        NotifyEvent::Stop => &sounds.stop,
                        NotifyEvent::Success => &sounds.success,
                        NotifyEvent::Error => &sounds.error,
                    };

                    if let Err(e) = play_wav(&stream_handle, data, volume) {
                        tracing::warn!("Failed to play {:?} cue: {}", event, e);
                    }
                }
            })
            .map_err(|e| format!("Failed to spawn playback thread: {}", e))?;

        init_rx
            .recv()
            .map_err(|_| "Playback thread exited during startup".to_string())??;

        Ok(Self { tx })
    }
}

impl Notifier for AudioNotifier {
    fn notify(&self, event: NotifyEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Playback thread gone, dropping {:?} cue", event);
        }
    }
}

fn play_wav(
    stream_handle: &rodio::OutputStreamHandle,
    data: &[u8],
    volume: f32,
) -> Result<(), String> {
    let cursor = Cursor::new(data.to_vec());
    let source = Decoder::new(cursor).map_err(|e| format!("Failed to decode audio: {}", e))?;
    let source = source.amplify(volume);

    let sink =
        Sink::try_new(stream_handle).map_err(|e| format!("Failed to create audio sink: {}", e))?;

    sink.append(source);
    sink.detach();

    Ok(())
}

/// Create the notifier according to configuration
pub fn create_notifier(config: &SoundConfig) -> Arc<dyn Notifier> {
    if !config.enabled {
        return Arc::new(NullNotifier);
    }

    match AudioNotifier::new(config) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::warn!("Sound cues disabled: {}", e);
            Arc::new(NullNotifier)
        }
    }
}

// === Sound generation ===

struct CueSounds {
    start: Vec<u8>,
    stop: Vec<u8>,
    success: Vec<u8>,
    error: Vec<u8>,
}

fn generate_cues() -> CueSounds {
    CueSounds {
        // Rising two-tone: recording begins
        start: generate_two_tone_wav(440.0, 880.0, 150, 20),
        // Falling two-tone: recording done, working
        stop: generate_two_tone_wav(880.0, 440.0, 150, 20),
        // High chime: transcript on the clipboard
        success: generate_two_tone_wav(880.0, 1320.0, 180, 20),
        // Low warning tone
        error: generate_two_tone_wav(300.0, 200.0, 200, 30),
    }
}

/// Generate a two-tone WAV (rising or falling)
fn generate_two_tone_wav(freq1: f32, freq2: f32, duration_ms: u32, fade_ms: u32) -> Vec<u8> {
    let sample_rate = 44100u32;
    let num_samples = (sample_rate * duration_ms / 1000) as usize;
    let fade_samples = (sample_rate * fade_ms / 1000) as usize;
    let half_samples = num_samples / 2;

    let mut samples: Vec<i16> = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let freq = if i < half_samples { freq1 } else { freq2 };
        let mut amplitude = (2.0 * std::f32::consts::PI * freq * t).sin();

        // Fade in/out envelope to avoid clicks
        if i < fade_samples {
            amplitude *= i as f32 / fade_samples as f32;
        } else if i >= num_samples - fade_samples {
            amplitude *= (num_samples - i) as f32 / fade_samples as f32;
        }

        samples.push((amplitude * 16000.0) as i16);
    }

    encode_wav(&samples, sample_rate)
}

/// Encode samples as a WAV byte buffer
fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let mut wav = Vec::new();

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    let file_size = (36 + samples.len() * 2) as u32;
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&((samples.len() * 2) as u32).to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}
