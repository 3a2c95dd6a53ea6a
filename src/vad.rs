//! Energy-based voice-activity gate
//!
//! Analyzes a recording in short frames and decides whether it contains
//! enough speech to be worth transcribing. Whisper hallucinates on silent
//! input, so recordings that never cross the energy threshold for at least
//! the minimum speech duration are dropped before inference.

/// Result of a voice-activity check
#[derive(Debug, Clone, Copy)]
pub struct VadResult {
    pub has_speech: bool,
    pub speech_duration_secs: f32,
    pub avg_rms: f32,
}

/// Energy-based VAD using RMS amplitude analysis
pub struct EnergyVad {
    /// RMS threshold above which a frame counts as speech
    threshold: f32,
    /// Minimum accumulated speech duration in milliseconds
    min_speech_ms: u32,
}

impl EnergyVad {
    /// Create a gate from a sensitivity setting (0.0 to 1.0) and the
    /// minimum silence gap, which doubles as the minimum speech duration.
    pub fn new(sensitivity: f32, min_speech_ms: u32) -> Self {
        Self {
            threshold: map_threshold_to_energy(sensitivity),
            min_speech_ms,
        }
    }

    /// Analyze i16 PCM samples at the given rate
    pub fn detect(&self, samples: &[i16], sample_rate: u32) -> VadResult {
        if samples.is_empty() {
            return VadResult {
                has_speech: false,
                speech_duration_secs: 0.0,
                avg_rms: 0.0,
            };
        }

        const FRAME_MS: usize = 20;
        let frame_size = (sample_rate as usize * FRAME_MS / 1000).max(1);

        let mut speech_frames = 0usize;
        let mut total_frames = 0usize;
        let mut total_energy = 0.0f32;

        for frame in samples.chunks(frame_size) {
            let rms = rms_energy(frame);
            total_energy += rms;
            total_frames += 1;

            if rms >= self.threshold {
                speech_frames += 1;
            }
        }

        let avg_rms = total_energy / total_frames as f32;
        let speech_duration_secs = (speech_frames * FRAME_MS) as f32 / 1000.0;
        let has_speech = speech_duration_secs >= self.min_speech_ms as f32 / 1000.0;

        tracing::debug!(
            "VAD: has_speech={}, speech_duration={:.2}s, avg_rms={:.4}, threshold={:.4}",
            has_speech,
            speech_duration_secs,
            avg_rms,
            self.threshold
        );

        VadResult {
            has_speech,
            speech_duration_secs,
            avg_rms,
        }
    }
}

/// RMS energy of one frame, normalized to 0.0..1.0
fn rms_energy(frame: &[i16]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = frame
        .iter()
        .map(|&s| {
            let v = s as f32 / i16::MAX as f32;
            v * v
        })
        .sum();
    (sum_squares / frame.len() as f32).sqrt()
}

/// Map sensitivity (0.0-1.0) to an energy threshold.
///
/// - 0.0 = very sensitive (~0.001, detects quiet whispers)
/// - 0.5 = balanced (~0.01, filters silence)
/// - 1.0 = aggressive (~0.1, requires louder speech)
fn map_threshold_to_energy(sensitivity: f32) -> f32 {
    let t = sensitivity.clamp(0.0, 1.0);
    0.001 * (100.0_f32).powf(t)
}
