//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Reads the environment into `Settings`
//! 2. Calls the library (render, store, push)
//! 3. Formats and displays output
//!
//! Pull-request creation is async; the store drives it on its own
//! runtime, so every handler here is synchronous.

mod completion;
mod push;
mod render;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use push::{push, target};
pub use render::{render, render_tree};

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Render { source } => render::render(ctx, &source),
        Command::Push(args) => push::push(ctx, &args),
        Command::Completion { shell } => {
            completion::completion(shell, &mut std::io::stdout())
        }
    }
}
