//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing for command handlers
//!
//! # Design
//!
//! Command results go to stdout and are never suppressed. Status lines
//! honor `--quiet`. Diagnostics go through `tracing` to stderr instead.

pub mod output;
