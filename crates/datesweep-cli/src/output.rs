//! Output mode shared by all subcommands.

use anyhow::Result;
use serde::Serialize;

/// How a subcommand reports to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
}

impl OutputMode {
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Quiet suppresses human-readable output and progress bars.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Whether an interactive progress bar should be drawn.
    pub fn shows_progress(&self) -> bool {
        !self.json && !self.quiet
    }
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
