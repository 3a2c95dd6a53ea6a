//! Clipboard delivery via external copy commands
//!
//! Tries platform clipboard commands in order (wl-copy on Wayland, xclip on
//! X11, pbcopy on macOS), piping the text to stdin. Optionally shows a
//! desktop notification with a transcript preview after a successful copy.

use super::TextOutput;
use crate::error::OutputError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Candidate copy commands in preference order for this platform
#[cfg(target_os = "macos")]
const COPY_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(not(target_os = "macos"))]
const COPY_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

/// Clipboard sink
pub struct ClipboardSink {
    /// Whether to show a desktop notification after copying
    notify: bool,
}

impl ClipboardSink {
    pub fn new(notify: bool) -> Self {
        Self { notify }
    }

    /// Pipe text into one copy command; Ok(None) means command not found
    async fn try_copy(
        &self,
        command: &str,
        args: &[&str],
        text: &str,
    ) -> Result<Option<()>, OutputError> {
        let mut child = match Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(OutputError::CopyFailed(e.to_string())),
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| OutputError::CopyFailed(e.to_string()))?;
            // Close stdin to signal EOF
            drop(stdin);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| OutputError::CopyFailed(e.to_string()))?;

        if !status.success() {
            return Err(OutputError::CopyFailed(format!(
                "{} exited with {}",
                command, status
            )));
        }

        Ok(Some(()))
    }

    /// Truncate a transcript to a notification-sized preview
    fn preview(text: &str) -> String {
        if text.chars().count() > 80 {
            format!("{}...", text.chars().take(80).collect::<String>())
        } else {
            text.to_string()
        }
    }

    /// Send a desktop notification, best-effort
    async fn send_notification(&self, text: &str) {
        let preview = Self::preview(text);

        #[cfg(target_os = "macos")]
        {
            let escaped = preview.replace('\\', "\\\\").replace('"', "\\\"");
            let script = format!(
                r#"display notification "{}" with title "Copied to clipboard""#,
                escaped
            );
            let _ = Command::new("osascript")
                .args(["-e", &script])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
        }

        #[cfg(not(target_os = "macos"))]
        {
            let _ = Command::new("notify-send")
                .args([
                    "--app-name=Voxclip",
                    "--urgency=low",
                    "--expire-time=3000",
                    "Copied to clipboard",
                    &preview,
                ])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
        }
    }
}

#[async_trait::async_trait]
impl TextOutput for ClipboardSink {
    async fn output(&self, text: &str) -> Result<(), OutputError> {
        if text.is_empty() {
            return Ok(());
        }

        for (command, args) in COPY_COMMANDS {
            match self.try_copy(command, args, text).await? {
                Some(()) => {
                    tracing::info!(
                        "Text copied to clipboard via {} ({} chars)",
                        command,
                        text.chars().count()
                    );

                    if self.notify {
                        self.send_notification(text).await;
                    }

                    return Ok(());
                }
                None => {
                    tracing::debug!("{} not found, trying next clipboard command", command);
                }
            }
        }

        Err(OutputError::ClipboardUnavailable)
    }

    fn name(&self) -> &'static str {
        "clipboard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text() {
        assert_eq!(ClipboardSink::preview("hello"), "hello");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "x".repeat(200);
        let preview = ClipboardSink::preview(&long);
        assert_eq!(preview.chars().count(), 83);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_preview_multibyte_safe() {
        let long = "é".repeat(100);
        let preview = ClipboardSink::preview(&long);
        assert!(preview.ends_with("..."));
    }
}
