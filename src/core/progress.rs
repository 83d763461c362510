//! Progress reporting utilities using indicatif.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar style for a batch of test identifiers.
pub fn batch_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .expect("valid template")
        .progress_chars("#>-")
}

/// Progress over a sequential batch.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Create a visible progress tracker with the given total count.
    pub fn new(total: usize, prefix: &str) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(batch_style());
        bar.set_prefix(prefix.to_string());
        Self { bar }
    }

    /// Create a hidden progress tracker.
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self { bar }
    }

    /// Visible when requested and stderr is a terminal, hidden otherwise.
    pub fn for_batch(total: usize, show: bool) -> Self {
        if show && is_tty() {
            Self::new(total, "tests")
        } else {
            Self::hidden(total)
        }
    }

    /// Increment the progress counter by one.
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Set the current progress message.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.bar.set_message(msg.into());
    }

    /// Finish the progress bar with a completion message.
    pub fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }

    /// Get the current position.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Check if stderr is a TTY.
pub fn is_tty() -> bool {
    std::io::stderr().is_terminal()
}
