use std::io::Write;

use crate::errors::{Result, SttError};
use crate::output::OutputSink;

/// Writes the rendered transcript to stdout. Diagnostics go to stderr, so
/// stdout stays pipeable.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write(&self, text: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{text}")
            .and_then(|_| out.flush())
            .map_err(|e| SttError::Output(format!("Failed to write transcript: {e}")))
    }
}
