//! Voxclip - hotkey dictation to your clipboard
//!
//! Run with `voxclip` or `voxclip daemon` to start the daemon.
//! Use `voxclip setup` to check the model and clipboard tooling.
//! Use `voxclip transcribe <file>` to transcribe an audio file.

use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use voxclip::cli::{Cli, Commands};
use voxclip::transcribe::SpeechModel;
use voxclip::{config, daemon, text, transcribe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("voxclip={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(model) = cli.model {
        config.model.name = model;
    }
    if let Some(hotkey) = cli.hotkey {
        config.hotkey.combo = hotkey;
    }

    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            let mut daemon = daemon::Daemon::new(config)?;
            daemon.run().await?;
        }

        Commands::Transcribe { file } => {
            transcribe_file(&config, &file)?;
        }

        Commands::Setup => {
            run_setup(&config)?;
        }

        Commands::Config => {
            show_config(&config)?;
        }
    }

    Ok(())
}

/// Transcribe an audio file and print the result
fn transcribe_file(config: &config::Config, path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Audio file not found: {:?}", path);
    }

    let model = transcribe::whisper::WhisperModel::load(&config.model)?;
    let segments = model.transcribe(path)?;

    let joined = segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        eprintln!("No speech detected.");
    } else {
        println!("{}", text::normalize(&joined));
    }

    Ok(())
}

/// Report whether the environment is ready for dictation
fn run_setup(config: &config::Config) -> anyhow::Result<()> {
    println!("voxclip setup check\n");

    // Model
    let model = &config.model.name;
    match transcribe::whisper::resolve_model_path(model) {
        Ok(path) => {
            println!("✓ Model '{}' found: {:?}", model, path);
        }
        Err(_) => {
            println!("✗ Model '{}' not found", model);
            println!("  Expected at: {:?}", config::Config::models_dir().join(transcribe::model_filename(model)));
            println!("  Download:    {}", transcribe::model_url(model));
        }
    }

    // Clipboard tooling
    let commands: &[&str] = if cfg!(target_os = "macos") {
        &["pbcopy"]
    } else {
        &["wl-copy", "xclip"]
    };

    let mut found = false;
    for cmd in commands {
        if let Ok(path) = which::which(cmd) {
            println!("✓ Clipboard command found: {:?}", path);
            found = true;
            break;
        }
    }
    if !found {
        println!("✗ No clipboard command found (install wl-clipboard or xclip)");
    }

    // Config file: create the commented template on first run
    match config::Config::default_path() {
        Some(path) if path.exists() => println!("✓ Config file: {:?}", path),
        Some(path) => {
            println!("\nCreating default config file...");
            config::Config::ensure_directories()?;
            std::fs::write(&path, config::DEFAULT_CONFIG)?;
            println!("✓ Created: {:?}", path);
        }
        None => println!("✗ Could not determine config directory"),
    }

    Ok(())
}

/// Print the active configuration as TOML
fn show_config(config: &config::Config) -> anyhow::Result<()> {
    if let Some(path) = config::Config::default_path() {
        if path.exists() {
            println!("# Loaded from {:?}\n", path);
        } else {
            println!("# Built-in defaults (no config file at {:?})\n", path);
        }
    }

    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
