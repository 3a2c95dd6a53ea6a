// Command-line interface definitions for voxclip
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voxclip")]
#[command(author, version, about = "Hotkey dictation to your clipboard")]
#[command(long_about = "
Voxclip turns speech into clipboard text with a single hotkey.
Press the hotkey to start recording, press it again to stop;
the recording is transcribed offline with Whisper and the text
lands on your clipboard, ready to paste anywhere.

SETUP:
  1. Run: voxclip setup (to check for the whisper model)
  2. Download the model it points you at, if missing
  3. Install wl-clipboard (Wayland) or xclip (X11); macOS needs nothing
  4. Run: voxclip (to start the daemon)

USAGE:
  Press ctrl+shift+9 (default), speak, press it again.
  Paste the transcript wherever you need it.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override whisper model (tiny, base, small, medium, large-v3, large-v3-turbo)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override hotkey combo (e.g., "ctrl+shift+9", "super+d")
    #[arg(long, value_name = "COMBO")]
    pub hotkey: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Transcribe an audio file (WAV, mono, 16-bit) and print the text
    Transcribe {
        /// Path to audio file
        file: std::path::PathBuf,
    },

    /// Check the environment: model presence, download URL, clipboard tools
    Setup,

    /// Show current configuration
    Config,
}
