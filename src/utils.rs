//! Diagnostic stream helpers: colored prefixes and a reporting sink.

use owo_colors::OwoColorize;
use std::fmt::Display;
use std::io::{IsTerminal, Write};

/// Colors are used only on a terminal and when `NO_COLOR` is unset.
pub fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

pub fn error_prefix(color: bool) -> String {
    if color {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

/// Sink for user-facing diagnostics, kept apart from rendered findings.
pub struct Diagnostics<'a> {
    out: &'a mut dyn Write,
    color: bool,
    reported: usize,
}

impl<'a> Diagnostics<'a> {
    pub fn new(out: &'a mut dyn Write, color: bool) -> Self {
        Self {
            out,
            color,
            reported: 0,
        }
    }

    pub fn error(&mut self, msg: impl Display) {
        let prefix = error_prefix(self.color);
        self.emit(prefix, msg);
    }

    /// Number of diagnostics written so far.
    pub fn reported(&self) -> usize {
        self.reported
    }

    fn emit(&mut self, prefix: String, msg: impl Display) {
        self.reported += 1;
        // A broken diagnostic stream must not abort the run.
        let _ = writeln!(self.out, "{} {}", prefix, msg);
    }
}
