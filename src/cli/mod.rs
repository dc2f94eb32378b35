//! cli
//!
//! Command-line interface layer for gitimpart.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers read the environment once into
//! [`Settings`](crate::core::config::Settings), then call [`crate::render`]
//! and [`crate::push`]. Errors are wrapped with `anyhow` context per stage.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::ui::output::{Printer, Verbosity};

/// Per-invocation state shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    pub fn printer(&self) -> Printer {
        Printer::stdio(self.verbosity())
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
    };
    init_tracing(&ctx);

    commands::dispatch(cli.command, &ctx)
}

/// Send logs to stderr. `--debug` and `--quiet` override `RUST_LOG`.
fn init_tracing(ctx: &Context) {
    let filter = if ctx.debug {
        EnvFilter::new("gitimpart=debug")
    } else if ctx.quiet {
        EnvFilter::new("gitimpart=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitimpart=info"))
    };

    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
