// src/notify/preview.rs
use std::io::Write;

/// Local destination for dry-run output.
pub trait PreviewSink: Send + Sync {
    fn emit(&self, channel: &str, text: &str);
}

/// Writes previews to stdout, one block per message.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutPreview;

impl PreviewSink for StdoutPreview {
    fn emit(&self, channel: &str, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "[{channel}] {text}\n") {
            tracing::warn!("preview write failed: {e}");
        }
    }
}
