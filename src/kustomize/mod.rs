//! kustomize
//!
//! Registers aggregation members into a `kustomization.yaml` by running the
//! `kustomize` executable.
//!
//! Only one tool operation is used: `kustomize edit add resource <path>`,
//! run with the aggregation directory as the working directory. Calls run
//! one at a time because each one rewrites the same manifest.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

use crate::render::content::join_repo_path;

/// Executable name searched on `PATH` when no override is configured.
pub const DEFAULT_BIN: &str = "kustomize";

/// Manifest file name inside every aggregation directory.
pub const MANIFEST: &str = "kustomization.yaml";

const EMPTY_MANIFEST: &str = "resources:\n";

/// Errors from kustomize integration.
#[derive(Debug, Error)]
pub enum KustomizeError {
    #[error("kustomize executable not found: {0}")]
    ToolNotFound(String),

    /// The tool ran and exited non-zero.
    #[error("`{command}` failed in {}: {output}", .dir.display())]
    ToolExecution {
        command: String,
        dir: PathBuf,
        /// Combined stdout and stderr
        output: String,
    },

    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A resolved kustomize executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kustomize {
    bin: PathBuf,
}

impl Kustomize {
    /// Resolve the executable from the process environment.
    ///
    /// An override containing a path separator is taken relative to the
    /// current directory and must be an executable file. A bare name
    /// (default `kustomize`) is searched on `PATH`.
    pub fn resolve(override_bin: Option<&Path>) -> Result<Self, KustomizeError> {
        let cwd = std::env::current_dir().map_err(|e| KustomizeError::Io {
            path: PathBuf::from("."),
            source: e,
        })?;
        Self::resolve_with(override_bin, std::env::var_os("PATH").as_deref(), &cwd)
    }

    /// Resolve against an explicit `PATH` value and current directory.
    pub fn resolve_with(
        override_bin: Option<&Path>,
        path_var: Option<&OsStr>,
        cwd: &Path,
    ) -> Result<Self, KustomizeError> {
        let requested = override_bin.unwrap_or_else(|| Path::new(DEFAULT_BIN));

        let bin = if requested.components().count() > 1 || requested.is_absolute() {
            let candidate = cwd.join(requested);
            is_executable(&candidate).then_some(candidate)
        } else {
            path_var
                .map(std::env::split_paths)
                .into_iter()
                .flatten()
                .map(|dir| dir.join(requested))
                .find(|candidate| is_executable(candidate))
        };

        let bin = bin.ok_or_else(|| KustomizeError::ToolNotFound(requested.display().to_string()))?;
        debug!(bin = %bin.display(), "resolved kustomize");
        Ok(Self { bin })
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Create `dir` and an empty manifest in it if either is missing.
    ///
    /// Returns the manifest path.
    pub fn ensure_manifest(dir: &Path) -> Result<PathBuf, KustomizeError> {
        if dir.exists() && !dir.is_dir() {
            return Err(KustomizeError::NotADirectory(dir.to_path_buf()));
        }
        fs::create_dir_all(dir).map_err(|e| KustomizeError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let manifest = dir.join(MANIFEST);
        if !manifest.exists() {
            debug!(path = %manifest.display(), "creating empty manifest");
            fs::write(&manifest, EMPTY_MANIFEST).map_err(|e| KustomizeError::Io {
                path: manifest.clone(),
                source: e,
            })?;
        }
        Ok(manifest)
    }

    /// Run `kustomize edit add resource <resource>` inside `dir`.
    pub fn add_resource(&self, dir: &Path, resource: &str) -> Result<(), KustomizeError> {
        let args = ["edit", "add", "resource", resource];
        let command = format!("{} {}", self.bin.display(), args.join(" "));
        debug!(dir = %dir.display(), %command, "running kustomize");

        let output = Command::new(&self.bin)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| KustomizeError::ToolExecution {
                command: command.clone(),
                dir: dir.to_path_buf(),
                output: e.to_string(),
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(KustomizeError::ToolExecution {
                command,
                dir: dir.to_path_buf(),
                output: combined.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Register `members` of the aggregation directory `dir` (relative to `root`).
    ///
    /// Returns the repository-relative paths touched: each member, then the
    /// manifest.
    pub fn register<'m>(
        &self,
        root: &Path,
        dir: &str,
        members: impl IntoIterator<Item = &'m str>,
    ) -> Result<Vec<String>, KustomizeError> {
        let abs_dir = root.join(dir);
        Self::ensure_manifest(&abs_dir)?;

        let mut touched = Vec::new();
        for member in members {
            self.add_resource(&abs_dir, member)?;
            touched.push(join_repo_path(dir, member));
        }
        touched.push(join_repo_path(dir, MANIFEST));

        info!(dir, resources = touched.len() - 1, "registered kustomize resources");
        Ok(touched)
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_manifest_creates_dir_and_file() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a/b");

        let manifest = Kustomize::ensure_manifest(&dir).unwrap();
        assert_eq!(manifest, dir.join(MANIFEST));
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "resources:\n");
    }

    #[test]
    fn ensure_manifest_keeps_existing() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(MANIFEST), "resources:\n- x.yaml\n").unwrap();

        Kustomize::ensure_manifest(root.path()).unwrap();
        assert_eq!(
            fs::read_to_string(root.path().join(MANIFEST)).unwrap(),
            "resources:\n- x.yaml\n"
        );
    }

    #[test]
    fn ensure_manifest_rejects_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("d");
        fs::write(&file, "").unwrap();

        assert!(matches!(
            Kustomize::ensure_manifest(&file),
            Err(KustomizeError::NotADirectory(_))
        ));
    }

    #[test]
    fn missing_tool_is_tool_not_found() {
        let empty = tempfile::tempdir().unwrap();
        let err = Kustomize::resolve_with(None, Some(empty.path().as_os_str()), empty.path())
            .unwrap_err();
        assert!(matches!(err, KustomizeError::ToolNotFound(ref name) if name == "kustomize"));

        let err = Kustomize::resolve_with(
            Some(Path::new("./bin/kustomize")),
            None,
            empty.path(),
        )
        .unwrap_err();
        assert!(matches!(err, KustomizeError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Appends each added resource to the manifest, failing on "bad.yaml".
        const FAKE: &str = r#"#!/bin/sh
if [ "$4" = "bad.yaml" ]; then echo "out: $4"; echo "err: invalid resource" >&2; exit 1; fi
echo "- $4" >> kustomization.yaml
"#;

        fn install(dir: &Path) -> PathBuf {
            let bin = dir.join("kustomize");
            fs::write(&bin, FAKE).unwrap();
            fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
            bin
        }

        #[test]
        fn resolves_on_path_and_by_relative_override() {
            let tools = tempfile::tempdir().unwrap();
            let bin = install(tools.path());

            let found = Kustomize::resolve_with(None, Some(tools.path().as_os_str()), Path::new("/"))
                .unwrap();
            assert_eq!(found.bin(), bin);

            let found =
                Kustomize::resolve_with(Some(Path::new("./kustomize")), None, tools.path()).unwrap();
            assert_eq!(found.bin(), tools.path().join("./kustomize"));
        }

        #[test]
        fn non_executable_override_is_not_found() {
            let tools = tempfile::tempdir().unwrap();
            let bin = tools.path().join("kustomize");
            fs::write(&bin, FAKE).unwrap();

            let err = Kustomize::resolve_with(Some(&bin), None, tools.path()).unwrap_err();
            assert!(matches!(err, KustomizeError::ToolNotFound(_)));
        }

        #[test]
        fn register_adds_resources_and_reports_touched() {
            let tools = tempfile::tempdir().unwrap();
            let kustomize = Kustomize { bin: install(tools.path()) };
            let root = tempfile::tempdir().unwrap();

            let touched = kustomize
                .register(root.path(), "dir", ["x.yaml", "y.yaml"])
                .unwrap();

            assert_eq!(touched, vec!["dir/x.yaml", "dir/y.yaml", "dir/kustomization.yaml"]);
            assert_eq!(
                fs::read_to_string(root.path().join("dir/kustomization.yaml")).unwrap(),
                "resources:\n- x.yaml\n- y.yaml\n"
            );
        }

        #[test]
        fn failing_tool_carries_combined_output() {
            let tools = tempfile::tempdir().unwrap();
            let kustomize = Kustomize { bin: install(tools.path()) };
            let root = tempfile::tempdir().unwrap();

            let err = kustomize
                .register(root.path(), "dir", ["bad.yaml"])
                .unwrap_err();
            match err {
                KustomizeError::ToolExecution { output, .. } => {
                    assert!(output.contains("out: bad.yaml"));
                    assert!(output.contains("err: invalid resource"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
