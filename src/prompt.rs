//! Interactive input and the terminal diff sink.

use crate::reconcile::{DiffSink, ReportLine};
use crate::report;
use crate::text_diff::RenderedDiff;
use std::io::{BufRead, IsTerminal, Write, stdin, stdout};
use std::path::Path;

/// Ask for one line of input. Returns the trimmed answer.
pub fn prompt_line(label: &str) -> std::io::Result<String> {
    print!("{label}");
    stdout().flush()?;
    let mut answer = String::new();
    stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Ask for a password without echoing it.
pub fn prompt_password(label: &str) -> std::io::Result<String> {
    rpassword::prompt_password(label)
}

/// Prints every difference as it is found, optionally waiting for Enter.
pub struct TerminalSink {
    pause: bool,
}

impl TerminalSink {
    /// Pausing only happens when stdin is a terminal.
    pub fn new(pause: bool) -> Self {
        TerminalSink {
            pause: pause && stdin().is_terminal(),
        }
    }
}

impl DiffSink for TerminalSink {
    fn on_difference(&mut self, line: &ReportLine, local_path: &Path, diff: &RenderedDiff) {
        report::print_difference(line, local_path, diff);
        if self.pause {
            // A failed prompt just means we stop waiting.
            if prompt_line("Press Enter to continue...").is_err() {
                self.pause = false;
            }
        }
    }
}
