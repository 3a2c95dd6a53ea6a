//! Configuration loading and types for voxclip
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/voxclip/config.toml)
//! 3. Environment variables (VOXCLIP_*)
//! 4. CLI arguments (highest priority)

use crate::error::VoxclipError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Voxclip Configuration
#
# Location: ~/.config/voxclip/config.toml
# All settings can be overridden via CLI flags

# How long to stay in the "completed" state after a successful
# transcription before returning to idle (milliseconds)
completed_hold_ms = 1500

[hotkey]
# Key combo that toggles recording. Press once to start, again to stop.
# Modifiers: ctrl, shift, alt, super. Other keys: a-z, 0-9, f1-f12, space
combo = "ctrl+shift+9"

# Enable the built-in global hotkey listener (default: true)
# enabled = true

[audio]
# Audio input device ("default" uses system default)
device = "default"

# Sample rate in Hz (whisper expects 16000; 44100 also supported)
sample_rate = 16000

# Samples per captured block
block_size = 1024

# Maximum recording duration in seconds (safety limit)
max_duration_secs = 120

[model]
# Whisper model for transcription
# Options: tiny, tiny.en, base, base.en, small, small.en, medium, medium.en,
#          large-v3, large-v3-turbo
# Or an absolute path to a custom ggml .bin file
name = "base.en"

# Language for transcription ("auto" for auto-detection)
language = "en"

# Translate non-English speech to English
translate = false

# Number of CPU threads for inference (omit for auto-detection)
# threads = 4

# Unload the model after this many seconds of inactivity to free memory
idle_timeout_secs = 300

# Minimum silence gap considered a speech boundary (milliseconds)
min_silence_ms = 500

# Voice-activity sensitivity, 0.0 (detect whispers) to 1.0 (loud speech only)
vad_threshold = 0.5

[clipboard]
# Show a desktop notification with a transcript preview after copying
notify = true

[sounds]
# Play audio cues for start/stop/success/error
enabled = true

# Volume level (0.0 to 1.0)
volume = 0.7
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub hotkey: HotkeyConfig,
    pub audio: AudioConfig,
    pub model: ModelConfig,

    #[serde(default)]
    pub clipboard: ClipboardConfig,

    #[serde(default)]
    pub sounds: SoundConfig,

    /// Hold time in the completed state before returning to idle
    #[serde(default = "default_completed_hold_ms")]
    pub completed_hold_ms: u64,
}

/// Hotkey configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    /// Key combo string, e.g. "ctrl+shift+9"
    #[serde(default = "default_combo")]
    pub combo: String,

    /// Enable the built-in global hotkey listener
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Audio capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// Input device name, or "default"
    pub device: String,

    /// Sample rate in Hz (16000 or 44100)
    pub sample_rate: u32,

    /// Samples per captured block
    #[serde(default = "default_block_size")]
    pub block_size: u32,

    /// Maximum recording duration in seconds (safety limit)
    pub max_duration_secs: u32,
}

impl AudioConfig {
    /// Recording length cap as a duration
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_duration_secs))
    }
}

/// Recognition model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Model name (tiny..large-v3-turbo) or an absolute path to a .bin file
    pub name: String,

    /// Language code (en, es, fr, auto, ...)
    pub language: String,

    /// Translate to English if the source language is not English
    #[serde(default)]
    pub translate: bool,

    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,

    /// Seconds of inactivity before the loaded model is unloaded
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Minimum silence gap treated as a speech boundary (ms)
    #[serde(default = "default_min_silence_ms")]
    pub min_silence_ms: u32,

    /// Voice-activity sensitivity (0.0 to 1.0)
    #[serde(default = "default_vad_threshold")]
    pub vad_threshold: f32,
}

/// Clipboard sink configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClipboardConfig {
    /// Show a desktop notification with a transcript preview after copying
    #[serde(default = "default_true")]
    pub notify: bool,
}

/// Sound cue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoundConfig {
    /// Play audio cues for recording events
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Volume level (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_combo() -> String {
    "ctrl+shift+9".to_string()
}

fn default_block_size() -> u32 {
    1024
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_min_silence_ms() -> u32 {
    500
}

fn default_vad_threshold() -> f32 {
    0.5
}

fn default_completed_hold_ms() -> u64 {
    1500
}

fn default_volume() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self { notify: true }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: HotkeyConfig {
                combo: default_combo(),
                enabled: true,
            },
            audio: AudioConfig {
                device: "default".to_string(),
                sample_rate: 16000,
                block_size: default_block_size(),
                max_duration_secs: 120,
            },
            model: ModelConfig {
                name: "base.en".to_string(),
                language: "en".to_string(),
                translate: false,
                threads: None,
                idle_timeout_secs: default_idle_timeout_secs(),
                min_silence_ms: default_min_silence_ms(),
                vad_threshold: default_vad_threshold(),
            },
            clipboard: ClipboardConfig::default(),
            sounds: SoundConfig::default(),
            completed_hold_ms: default_completed_hold_ms(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voxclip")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voxclip")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path (for models)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "voxclip")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the models directory path
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories() -> std::io::Result<()> {
        if let Some(config_dir) = Self::config_dir() {
            std::fs::create_dir_all(&config_dir)?;
            tracing::debug!("Ensured config directory exists: {:?}", config_dir);
        }

        let models_dir = Self::models_dir();
        std::fs::create_dir_all(&models_dir)?;
        tracing::debug!("Ensured models directory exists: {:?}", models_dir);

        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, VoxclipError> {
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| VoxclipError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| VoxclipError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(combo) = std::env::var("VOXCLIP_HOTKEY") {
        config.hotkey.combo = combo;
    }
    if let Ok(model) = std::env::var("VOXCLIP_MODEL") {
        config.model.name = model;
    }

    if config.audio.sample_rate != 16000 && config.audio.sample_rate != 44100 {
        return Err(VoxclipError::Config(format!(
            "Unsupported sample rate: {} (expected 16000 or 44100)",
            config.audio.sample_rate
        )));
    }

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<(), VoxclipError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| VoxclipError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| VoxclipError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| VoxclipError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}
