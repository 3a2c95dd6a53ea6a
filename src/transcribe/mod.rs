//! Speech-to-text transcription module
//!
//! Provides the `SpeechModel` abstraction over recognition backends and the
//! whisper.cpp implementation (whisper-rs crate).

pub mod whisper;

use crate::error::TranscribeError;
use std::path::Path;

/// A recognizer-produced span of text with timing, before normalization.
///
/// Consumed transiently; never persisted.
#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start offset in milliseconds
    pub start_ms: i64,
    /// End offset in milliseconds
    pub end_ms: i64,
}

/// Trait for speech recognition backends.
///
/// Input is a path to a mono 16-bit WAV artifact; output is the finite
/// sequence of timed segments, consumed exactly once per transcription.
pub trait SpeechModel: Send + Sync {
    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, TranscribeError>;
}

/// Get the ggml filename for a model name
pub fn model_filename(model: &str) -> String {
    match model {
        "tiny" => "ggml-tiny.bin",
        "tiny.en" => "ggml-tiny.en.bin",
        "base" => "ggml-base.bin",
        "base.en" => "ggml-base.en.bin",
        "small" => "ggml-small.bin",
        "small.en" => "ggml-small.en.bin",
        "medium" => "ggml-medium.bin",
        "medium.en" => "ggml-medium.en.bin",
        "large" | "large-v3" => "ggml-large-v3.bin",
        "large-v3-turbo" => "ggml-large-v3-turbo.bin",
        other => other,
    }
    .to_string()
}

/// Get the download URL for a model
pub fn model_url(model: &str) -> String {
    format!(
        "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/{}",
        model_filename(model)
    )
}
