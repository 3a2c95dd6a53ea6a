//! Transcription engine
//!
//! Turns a finalized recording into publishable text: voice-activity gate,
//! model acquisition, temporary WAV artifact, recognition, normalization.
//! All of this is blocking work; the controller runs it on a blocking task.

use crate::audio::CapturedUtterance;
use crate::error::TranscribeError;
use crate::model::ModelManager;
use crate::text;
use crate::vad::EnergyVad;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Result of one transcription run.
///
/// `text` is `None` when no speech was detected, which is a normal outcome.
/// `artifact_cleanup_failed` is reported separately because a cleanup
/// failure must not discard an already-produced transcript, but callers do
/// surface it as an error cue.
#[derive(Debug)]
pub struct TranscriptionOutcome {
    pub text: Option<String>,
    pub artifact_cleanup_failed: bool,
}

/// Engine that runs a captured utterance through the recognition model
pub struct TranscriptionEngine {
    models: Arc<ModelManager>,
    vad: EnergyVad,
}

impl TranscriptionEngine {
    pub fn new(models: Arc<ModelManager>, vad: EnergyVad) -> Self {
        Self { models, vad }
    }

    /// Transcribe a finalized recording.
    ///
    /// Blocking: model load and inference can take seconds. The model handle
    /// is held across the inference call so an idle-timeout sweep running
    /// concurrently cannot unload the model mid-use.
    pub fn transcribe(
        &self,
        utterance: &CapturedUtterance,
    ) -> Result<TranscriptionOutcome, TranscribeError> {
        let vad_result = self.vad.detect(utterance.samples(), utterance.sample_rate());
        if !vad_result.has_speech {
            tracing::info!(
                "No speech detected ({:.2}s of audio, avg_rms={:.4}), skipping transcription",
                utterance.duration_secs(),
                vad_result.avg_rms
            );
            return Ok(TranscriptionOutcome {
                text: None,
                artifact_cleanup_failed: false,
            });
        }

        let handle = self.models.acquire()?;
        self.models.touch();

        let artifact = write_artifact(utterance)?;
        tracing::debug!("Wrote audio artifact: {:?}", artifact.path());

        let result = handle.model().transcribe(artifact.path());

        // Delete the artifact on every exit path; NamedTempFile's Drop
        // covers panics, close() surfaces deletion errors here.
        let artifact_cleanup_failed = match artifact.close() {
            Ok(()) => false,
            Err(e) => {
                tracing::warn!("Failed to remove audio artifact: {}", e);
                true
            }
        };

        let segments = result?;
        self.models.touch();
        self.models.sweep();

        let joined = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            tracing::info!("Recognizer produced no text");
            return Ok(TranscriptionOutcome {
                text: None,
                artifact_cleanup_failed,
            });
        }

        Ok(TranscriptionOutcome {
            text: Some(text::normalize(&joined)),
            artifact_cleanup_failed,
        })
    }
}

/// Persist the utterance as a mono 16-bit WAV temp file
fn write_artifact(utterance: &CapturedUtterance) -> Result<NamedTempFile, TranscribeError> {
    let mut file = tempfile::Builder::new()
        .prefix("voxclip-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| TranscribeError::ArtifactIo(e.to_string()))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: utterance.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    {
        let mut writer = hound::WavWriter::new(file.as_file_mut(), spec)
            .map_err(|e| TranscribeError::ArtifactIo(e.to_string()))?;

        for &sample in utterance.samples() {
            writer
                .write_sample(sample)
                .map_err(|e| TranscribeError::ArtifactIo(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| TranscribeError::ArtifactIo(e.to_string()))?;
    }

    file.as_file_mut()
        .flush()
        .map_err(|e| TranscribeError::ArtifactIo(e.to_string()))?;

    Ok(file)
}
