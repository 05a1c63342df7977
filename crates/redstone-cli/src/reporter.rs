//! Terminal progress output.

use colored::Colorize;
use redstone_spec::{Cancelled, ProgressEvent, ProgressReporter};

/// Prints progress events to stderr as colored lines. Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that prints nothing, for `--json` runs.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    /// Renders one event without color codes.
    pub fn format_event(event: &ProgressEvent) -> String {
        match event {
            ProgressEvent::Step { progress, message } => format!("[{:>3}%] {}", progress, message),
            ProgressEvent::Complete { file_id, stats, .. } => format!(
                "[100%] complete: {} notes, {:.1}s ({})",
                stats.notes, stats.duration, file_id
            ),
            ProgressEvent::Failed { error, .. } => format!("[ -- ] failed: {}", error),
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: ProgressEvent) -> Result<(), Cancelled> {
        if self.quiet {
            return Ok(());
        }
        let line = Self::format_event(&event);
        match event {
            ProgressEvent::Step { .. } => eprintln!("{}", line.dimmed()),
            ProgressEvent::Complete { .. } => eprintln!("{}", line.green()),
            ProgressEvent::Failed { .. } => eprintln!("{}", line.red()),
        }
        Ok(())
    }
}
