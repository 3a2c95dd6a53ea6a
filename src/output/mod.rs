//! Text output module
//!
//! The core emits one UTF-8 string per successful session; delivery goes to
//! the system clipboard through an external copy command.

pub mod clipboard;

use crate::config::ClipboardConfig;
use crate::error::OutputError;
use std::sync::Arc;

/// Trait for text delivery sinks
#[async_trait::async_trait]
pub trait TextOutput: Send + Sync {
    /// Deliver the text
    async fn output(&self, text: &str) -> Result<(), OutputError>;

    /// Human-readable name for logs
    fn name(&self) -> &'static str;
}

/// Create the clipboard sink
pub fn create_sink(config: &ClipboardConfig) -> Arc<dyn TextOutput> {
    Arc::new(clipboard::ClipboardSink::new(config.notify))
}
