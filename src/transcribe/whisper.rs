//! Whisper-based speech recognition
//!
//! Uses whisper.cpp via the whisper-rs crate for fast, local transcription.

use super::{SpeechModel, TranscriptSegment};
use crate::config::{Config, ModelConfig};
use crate::error::{ModelError, TranscribeError};
use std::path::{Path, PathBuf};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper-backed speech model
pub struct WhisperModel {
    /// Whisper context (holds the loaded model weights)
    ctx: WhisperContext,
    language: String,
    translate: bool,
    threads: usize,
}

impl WhisperModel {
    /// Load the configured model into memory.
    ///
    /// This can take seconds for the large models; callers run it on a
    /// blocking task.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        let model_path = resolve_model_path(&config.name)?;

        tracing::info!("Loading whisper model from {:?}", model_path);
        let start = std::time::Instant::now();

        let ctx = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| ModelError::NotFound("Invalid model path".to_string()))?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| ModelError::LoadFailed(e.to_string()))?;

        tracing::info!("Model loaded in {:.2}s", start.elapsed().as_secs_f32());

        let threads = config.threads.unwrap_or_else(|| num_cpus::get().min(4));

        Ok(Self {
            ctx,
            language: config.language.clone(),
            translate: config.translate,
            threads,
        })
    }
}

impl SpeechModel for WhisperModel {
    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        let samples = read_wav_mono_f32(audio)?;

        if samples.is_empty() {
            return Err(TranscribeError::AudioFormat(
                "Empty audio artifact".to_string(),
            ));
        }

        let duration_secs = samples.len() as f32 / 16000.0;
        tracing::debug!(
            "Transcribing {:.2}s of audio ({} samples)",
            duration_secs,
            samples.len()
        );

        let start = std::time::Instant::now();

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| TranscribeError::Inference(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // "auto" enables whisper's language detection
        if self.language == "auto" {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.language));
        }

        params.set_translate(self.translate);
        params.set_n_threads(self.threads as i32);

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        params.set_suppress_blank(true);
        params.set_suppress_nst(true);

        // Word-level timing so segment boundaries are available downstream
        params.set_token_timestamps(true);

        state
            .full(params, &samples)
            .map_err(|e| TranscribeError::Inference(e.to_string()))?;

        let mut segments = Vec::new();
        for segment in state.as_iter() {
            let text = segment
                .to_str()
                .map_err(|e| TranscribeError::Inference(e.to_string()))?;

            segments.push(TranscriptSegment {
                text: text.to_string(),
                // whisper reports centiseconds
                start_ms: segment.start_timestamp() * 10,
                end_ms: segment.end_timestamp() * 10,
            });
        }

        tracing::info!(
            "Transcription completed in {:.2}s: {} segment(s)",
            start.elapsed().as_secs_f32(),
            segments.len()
        );

        Ok(segments)
    }
}

/// Read a mono 16-bit WAV artifact into normalized f32 samples
fn read_wav_mono_f32(path: &Path) -> Result<Vec<f32>, TranscribeError> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| TranscribeError::ArtifactIo(e.to_string()))?;

    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 {
        return Err(TranscribeError::AudioFormat(format!(
            "Expected mono 16-bit WAV, got {} channel(s) at {} bits",
            spec.channels, spec.bits_per_sample
        )));
    }

    let samples: Vec<f32> = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect::<Result<_, _>>()
        .map_err(|e| TranscribeError::ArtifactIo(e.to_string()))?;

    // whisper.cpp expects 16 kHz input
    if spec.sample_rate != 16000 {
        return Ok(crate::audio::resample(&samples, spec.sample_rate, 16000));
    }

    Ok(samples)
}

/// Resolve a model name to an on-disk file path
pub fn resolve_model_path(model: &str) -> Result<PathBuf, ModelError> {
    // Absolute paths are used directly
    let path = PathBuf::from(model);
    if path.is_absolute() {
        if path.exists() {
            return Ok(path);
        }
        return Err(ModelError::NotFound(format!(
            "Model file does not exist: {}",
            path.display()
        )));
    }

    let filename = super::model_filename(model);
    if !filename.ends_with(".bin") {
        return Err(ModelError::NotFound(format!(
            "Unknown model: '{}'. Valid models: tiny, base, small, medium, large-v3, large-v3-turbo",
            model
        )));
    }

    let model_path = Config::models_dir().join(&filename);
    if model_path.exists() {
        return Ok(model_path);
    }

    // Also check the working directory and ./models/
    let cwd_path = PathBuf::from(&filename);
    if cwd_path.exists() {
        return Ok(cwd_path);
    }

    let local_models_path = PathBuf::from("models").join(&filename);
    if local_models_path.exists() {
        return Ok(local_models_path);
    }

    Err(ModelError::NotFound(format!(
        "Model '{}' not found. Looked in:\n  - {}\n  - {}\n  - {}\n\nDownload from: {}",
        model,
        model_path.display(),
        cwd_path.display(),
        local_models_path.display(),
        super::model_url(model)
    )))
}

/// Check whether the configured model's files are present on disk
pub fn model_is_ready(model: &str) -> bool {
    resolve_model_path(model).is_ok()
}
