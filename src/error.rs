//! Error types for voxclip
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the voxclip application
#[derive(Error, Debug)]
pub enum VoxclipError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Audio capture error: {0}")]
    Audio(#[from] AudioError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to hotkey detection
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Unknown key name: '{0}'. Use names like 'ctrl', 'shift', 'alt', 'super', 'f1'..'f12', or a single character.")]
    UnknownKey(String),

    #[error("Empty hotkey combo. Set [hotkey] combo in the config, e.g. \"ctrl+shift+9\".")]
    EmptyCombo,

    #[error("Hotkey backend error: {0}")]
    Backend(String),
}

/// Errors related to audio capture
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio connection failed: {0}")]
    Device(String),

    #[error("Audio device not found: '{0}'")]
    DeviceNotFound(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("No audio was captured. Check your microphone.")]
    EmptyBuffer,
}

/// Errors related to the recognition model lifecycle
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model not found: {0}\n  Run 'voxclip setup' for the expected path and download URL.")]
    NotFound(String),

    #[error("Model load failed: {0}")]
    LoadFailed(String),

    #[error("Model load cancelled: application is shutting down")]
    Cancelled,
}

/// Errors related to speech-to-text transcription
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Transcription failed: {0}")]
    Inference(String),

    #[error("Audio artifact error: {0}")]
    ArtifactIo(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),
}

/// Errors related to clipboard delivery
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("No clipboard command available. Install wl-clipboard (Wayland), xclip (X11), or run on macOS.")]
    ClipboardUnavailable,

    #[error("Clipboard copy failed: {0}")]
    CopyFailed(String),
}

/// Result type alias using VoxclipError
pub type Result<T> = std::result::Result<T, VoxclipError>;
