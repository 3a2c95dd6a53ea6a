//! Voxclip: hotkey dictation to your clipboard
//!
//! This library provides the core functionality for:
//! - Watching a global toggle hotkey via rdev
//! - Capturing audio via cpal (supports PipeWire, PulseAudio, ALSA, CoreAudio)
//! - Transcribing speech using whisper.cpp (fast, local, offline)
//! - Normalizing transcripts into sentence-cased text
//! - Copying the result to the system clipboard
//!
//! # Architecture
//!
//! ```text
//!             ┌──────────────────────────────────────┐
//!             │                Daemon                │
//!             └──────────────────────────────────────┘
//!                     │                    │
//!                     ▼                    ▼
//!             ┌──────────────┐     ┌──────────────┐
//!             │    Hotkey    │     │    Model     │
//!             │    (rdev)    │     │   Manager    │ (lazy load, idle unload)
//!             └──────────────┘     └──────────────┘
//!                     │ toggle             │
//!                     ▼                    │
//!             ┌──────────────────────────────────────┐
//!             │          Recording Controller        │
//!             │  Idle → Recording → Processing →     │
//!             │        Completed → Idle              │
//!             └──────────────────────────────────────┘
//!                     │ captured audio
//!                     ▼
//!             ┌──────────────┐  VAD gate  ┌──────────────┐
//!             │ Transcription│───────────▶│   Whisper    │
//!             │    Engine    │            │ (whisper-rs) │
//!             └──────────────┘            └──────────────┘
//!                     │ normalized text
//!                     ▼
//!             ┌──────────────┐
//!             │  Clipboard   │
//!             │ (wl-copy /   │
//!             │ xclip/pbcopy)│
//!             └──────────────┘
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod hotkey;
pub mod model;
pub mod notify;
pub mod output;
pub mod state;
pub mod text;
pub mod transcribe;
pub mod vad;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Result, VoxclipError};
