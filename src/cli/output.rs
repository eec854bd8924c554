//! Console output utilities
//!
//! Plain-text helpers for the non-logging parts of the CLI output, plus the
//! writer that tees log lines to the console and the run's log file.

use crate::core::eta::format_duration;
use crate::core::orchestrator::RunResult;
use std::io::Write;

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║ {} ║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

/// One-line verdict for a finished run
pub fn run_verdict(result: &RunResult) -> String {
    let elapsed = format_duration(result.total_elapsed.as_secs_f64());
    if result.interrupted {
        format!(
            "Interrupted after {} folders; {} files copied in {}",
            result.folders_processed(),
            result.files_copied,
            elapsed
        )
    } else if !result.errored.is_empty() {
        format!(
            "{} folders need another run: {}",
            result.errored.len(),
            result.errored.join(", ")
        )
    } else {
        format!(
            "All {} folders up to date; {} files copied in {}",
            result.folders_processed(),
            result.files_copied,
            elapsed
        )
    }
}

/// Print the verdict with the matching marker
pub fn print_run_verdict(result: &RunResult) {
    let verdict = run_verdict(result);
    if result.interrupted || !result.errored.is_empty() {
        print_warning(&verdict);
    } else {
        print_success(&verdict);
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write_all(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}
