//! render
//!
//! Turns a source file into a [`ContentTree`].
//!
//! # Modules
//!
//! - [`content`] - The content model and its serialization rules
//! - [`template`] - Template evaluator seam and the `jsonnet` CLI evaluator
//! - [`renderer`] - Loading, evaluation, parsing and aggregation expansion
//!
//! # Example
//!
//! ```no_run
//! use gitimpart::core::config::Settings;
//! use gitimpart::render::{JsonnetCli, Renderer};
//! use std::path::Path;
//!
//! let settings = Settings::from_env("GITHUB_TOKEN");
//! let renderer = Renderer::new(Box::new(JsonnetCli::default()), &settings)
//!     .with_var("project", "myproject");
//! let tree = renderer.render_file(Path::new("deploy.jsonnet"))?;
//! println!("{}", tree.files.len());
//! # Ok::<(), gitimpart::render::RenderError>(())
//! ```

pub mod content;
pub mod renderer;
pub mod template;

pub use content::{Content, ContentError, ContentTree};
pub use renderer::Renderer;
pub use template::{JsonnetCli, TemplateEvaluator};

use std::path::PathBuf;
use thiserror::Error;

use crate::core::config::ConfigError;

/// Errors from rendering a source file.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to evaluate '{path}': {message}")]
    Evaluate { path: PathBuf, message: String },

    /// The template referenced an external variable that was not supplied.
    #[error("failed to evaluate '{path}': undefined external variable '{name}'")]
    UndefinedVariable { path: PathBuf, name: String },

    #[error("template evaluator '{}' not found", .bin.display())]
    EvaluatorNotFound { bin: PathBuf },

    #[error("failed to parse rendered content of '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
