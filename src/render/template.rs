//! render::template
//!
//! Template evaluation seam.
//!
//! The renderer does not evaluate templates itself. A [`TemplateEvaluator`]
//! turns a template file plus named external string variables into JSON
//! text. [`JsonnetCli`] runs the `jsonnet` executable; tests substitute
//! their own evaluator.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::RenderError;

/// Marker in jsonnet error output for a missing external variable.
const UNDEFINED_EXTVAR: &str = "Undefined external variable";

/// Evaluates a template file into JSON text.
pub trait TemplateEvaluator: Send + Sync {
    /// Evaluator name for logs.
    fn name(&self) -> &'static str;

    /// Evaluate `path` with the given external variables.
    ///
    /// # Errors
    ///
    /// - `RenderError::UndefinedVariable` if the template references a
    ///   variable that is not in `vars`
    /// - `RenderError::Evaluate` for any other evaluation failure
    fn evaluate(&self, path: &Path, vars: &BTreeMap<String, String>)
        -> Result<String, RenderError>;
}

/// Evaluator backed by the `jsonnet` command-line tool.
#[derive(Debug, Clone)]
pub struct JsonnetCli {
    bin: PathBuf,
}

impl Default for JsonnetCli {
    fn default() -> Self {
        Self::new("jsonnet")
    }
}

impl JsonnetCli {
    /// Use the given executable (a bare name is looked up on `PATH`).
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Build the argument list: one `--ext-str name=value` per variable, then the file.
    fn args(path: &Path, vars: &BTreeMap<String, String>) -> Vec<String> {
        let mut args = Vec::with_capacity(vars.len() * 2 + 1);
        for (name, value) in vars {
            args.push("--ext-str".to_string());
            args.push(format!("{}={}", name, value));
        }
        args.push(path.display().to_string());
        args
    }
}

impl TemplateEvaluator for JsonnetCli {
    fn name(&self) -> &'static str {
        "jsonnet"
    }

    fn evaluate(
        &self,
        path: &Path,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, RenderError> {
        let output = Command::new(&self.bin)
            .args(Self::args(path, vars))
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    RenderError::EvaluatorNotFound {
                        bin: self.bin.clone(),
                    }
                } else {
                    RenderError::Evaluate {
                        path: path.to_path_buf(),
                        message: format!("failed to run {}: {}", self.bin.display(), e),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(match undefined_variable(&stderr) {
                Some(name) => RenderError::UndefinedVariable {
                    path: path.to_path_buf(),
                    name,
                },
                None => RenderError::Evaluate {
                    path: path.to_path_buf(),
                    message: stderr.trim().to_string(),
                },
            });
        }

        String::from_utf8(output.stdout).map_err(|_| RenderError::Evaluate {
            path: path.to_path_buf(),
            message: "evaluation output is not valid UTF-8".into(),
        })
    }
}

/// Extract the variable name from an "Undefined external variable: NAME" message.
fn undefined_variable(stderr: &str) -> Option<String> {
    let rest = &stderr[stderr.find(UNDEFINED_EXTVAR)? + UNDEFINED_EXTVAR.len()..];
    let name = rest
        .trim_start_matches([':', ' '])
        .split(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}
