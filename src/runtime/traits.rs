//! Trait abstractions for runtime I/O
//!
//! These traits let the orchestrator be tested with recording mocks.

use std::io::Write;
use std::sync::Arc;

/// Receives assistant text as it streams in
pub trait FragmentSink: Send + Sync {
    /// Show one fragment immediately
    fn display(&self, fragment: &str);
}

impl<T: FragmentSink + ?Sized> FragmentSink for Arc<T> {
    fn display(&self, fragment: &str) {
        (**self).display(fragment);
    }
}

/// Writes fragments to stdout, flushing after each one
pub struct StdoutSink;

impl FragmentSink for StdoutSink {
    fn display(&self, fragment: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(fragment.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "Failed to write fragment to stdout");
        }
    }
}
