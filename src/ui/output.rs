//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! A [`Printer`] owns the two streams a command writes to. Results (rendered
//! JSON, diffs) always reach stdout; status lines are dropped under
//! `--quiet`.

use std::fmt::Display;
use std::io::{self, Write};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - results and errors only
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

pub struct Printer {
    verbosity: Verbosity,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Printer {
    /// Printer on the process stdout and stderr.
    pub fn stdio(verbosity: Verbosity) -> Self {
        Self::with_writers(verbosity, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(verbosity: Verbosity, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self { verbosity, out, err }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Print command output. Never suppressed.
    pub fn result(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    /// Print a status line (respects quiet mode).
    pub fn status(&mut self, message: impl Display) -> io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        writeln!(self.out, "{}", message)
    }

    /// Print extra detail (only in debug mode).
    pub fn detail(&mut self, message: impl Display) -> io::Result<()> {
        if self.verbosity != Verbosity::Debug {
            return Ok(());
        }
        writeln!(self.err, "[debug] {}", message)
    }

    /// Print a warning (respects quiet mode).
    pub fn warn(&mut self, message: impl Display) -> io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        writeln!(self.err, "warning: {}", message)
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
