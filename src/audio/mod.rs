//! Audio capture module
//!
//! Provides the capture buffer shared between the audio device callback and
//! the recording controller, plus the `AudioCapture` abstraction over the
//! input stream backend (cpal).

pub mod cpal_capture;

use crate::config::AudioConfig;
use crate::error::AudioError;
use std::sync::{Arc, Mutex};

/// One fixed-size block of converted samples from the device callback
pub type AudioBlock = Vec<i16>;

/// A finalized recording: all captured samples in arrival order.
///
/// Immutable once constructed; handed from the controller to the
/// transcription engine.
#[derive(Debug, Clone)]
pub struct CapturedUtterance {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl CapturedUtterance {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Thread-safe accumulator of audio blocks.
///
/// `append_f32` runs on the device callback thread and must stay cheap: it
/// converts one block to i16 PCM and pushes it, holding the lock only for
/// the push. `drain` runs once per session on the controller side and does
/// the concatenation there.
pub struct CaptureBuffer {
    blocks: Mutex<Vec<AudioBlock>>,
    sample_rate: u32,
}

impl CaptureBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            blocks: Mutex::new(Vec::new()),
            sample_rate,
        }
    }

    /// Convert a block of device f32 samples to i16 PCM and retain it.
    ///
    /// Scaling is a plain multiply by `i16::MAX` with truncation; no dynamic
    /// range compression.
    pub fn append_f32(&self, block: &[f32]) {
        if block.is_empty() {
            return;
        }

        let converted: AudioBlock = block
            .iter()
            .map(|&s| (s * i16::MAX as f32) as i16)
            .collect();

        if let Ok(mut blocks) = self.blocks.lock() {
            blocks.push(converted);
        }
    }

    /// Number of blocks currently retained
    pub fn block_count(&self) -> usize {
        self.blocks.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Clear retained blocks at the start of a new session
    pub fn reset(&self) {
        if let Ok(mut blocks) = self.blocks.lock() {
            blocks.clear();
        }
    }

    /// Take all retained blocks, concatenated in arrival order.
    ///
    /// Fails with `EmptyBuffer` if the device produced no callbacks before
    /// stop was requested.
    pub fn drain(&self) -> Result<CapturedUtterance, AudioError> {
        let blocks = {
            let mut guard = self
                .blocks
                .lock()
                .map_err(|_| AudioError::Stream("capture buffer poisoned".to_string()))?;
            std::mem::take(&mut *guard)
        };

        if blocks.is_empty() {
            return Err(AudioError::EmptyBuffer);
        }

        let total: usize = blocks.iter().map(|b| b.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for block in &blocks {
            samples.extend_from_slice(block);
        }

        Ok(CapturedUtterance::new(samples, self.sample_rate))
    }
}

/// Trait for audio input backends
///
/// `start` opens the input stream and begins filling the given buffer from
/// the device callback; `stop` closes the stream. All blocking happens on a
/// dedicated capture thread inside the implementation.
#[async_trait::async_trait]
pub trait AudioCapture: Send {
    async fn start(&mut self, buffer: Arc<CaptureBuffer>) -> Result<(), AudioError>;
    async fn stop(&mut self) -> Result<(), AudioError>;
}

/// Factory function to create the audio capture backend
pub fn create_capture(config: &AudioConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
    Ok(Box::new(cpal_capture::CpalCapture::new(config)?))
}

/// Linear interpolation resampling.
///
/// Used on the capture path when the device rate differs from the
/// configured rate, and again before inference for 44.1 kHz recordings.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = (src_idx - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else {
            samples.get(idx).copied().unwrap_or(0.0)
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_append_order() {
        let buffer = CaptureBuffer::new(16000);
        buffer.append_f32(&[0.5; 100]);
        buffer.append_f32(&[-0.5; 100]);
        buffer.append_f32(&[0.25; 100]);

        let utterance = buffer.drain().unwrap();
        assert_eq!(utterance.len(), 300);
        assert_eq!(utterance.sample_rate(), 16000);

        // Order preserved: first 100 positive, next 100 negative
        assert!(utterance.samples()[..100].iter().all(|&s| s > 0));
        assert!(utterance.samples()[100..200].iter().all(|&s| s < 0));
        assert!(utterance.samples()[200..].iter().all(|&s| s > 0));
    }

    #[test]
    fn test_drain_empty_fails() {
        let buffer = CaptureBuffer::new(16000);
        assert!(matches!(buffer.drain(), Err(AudioError::EmptyBuffer)));
    }

    #[test]
    fn test_conversion_scales_to_full_range() {
        let buffer = CaptureBuffer::new(16000);
        buffer.append_f32(&[1.0, -1.0, 0.0]);

        let utterance = buffer.drain().unwrap();
        assert_eq!(utterance.samples()[0], i16::MAX);
        assert_eq!(utterance.samples()[1], -i16::MAX);
        assert_eq!(utterance.samples()[2], 0);
    }

    #[test]
    fn test_reset_discards_blocks() {
        let buffer = CaptureBuffer::new(16000);
        buffer.append_f32(&[0.1; 64]);
        assert_eq!(buffer.block_count(), 1);

        buffer.reset();
        assert_eq!(buffer.block_count(), 0);
        assert!(matches!(buffer.drain(), Err(AudioError::EmptyBuffer)));
    }

    #[test]
    fn test_empty_block_ignored() {
        let buffer = CaptureBuffer::new(16000);
        buffer.append_f32(&[]);
        assert_eq!(buffer.block_count(), 0);
    }

    #[test]
    fn test_utterance_duration() {
        let utterance = CapturedUtterance::new(vec![0; 16000], 16000);
        assert!((utterance.duration_secs() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resample_same_rate() {
        let samples = vec![1.0, 2.0, 3.0, 4.0];
        let result = resample(&samples, 16000, 16000);
        assert_eq!(result, samples);
    }

    #[test]
    fn test_resample_downsample() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let result = resample(&samples, 48000, 16000);
        // 3:1 ratio, 8 samples -> ~3 samples
        assert!(result.len() >= 2 && result.len() <= 4);
    }

    #[test]
    fn test_resample_upsample() {
        let samples = vec![1.0, 2.0];
        let result = resample(&samples, 8000, 16000);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_resample_empty() {
        let samples: Vec<f32> = vec![];
        assert!(resample(&samples, 48000, 16000).is_empty());
    }

    #[test]
    fn test_resample_second_of_audio() {
        let samples = vec![0.0; 44100];
        let out = resample(&samples, 44100, 16000);
        assert!((out.len() as i64 - 16000).abs() <= 1);
    }
}
