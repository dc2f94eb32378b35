//! store::workdir
//!
//! Working directory ownership and the file operations shared by the
//! filesystem-backed stores.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{resolve_path, StoreError};

/// A directory a store writes into.
///
/// `Borrowed` belongs to the caller and is left in place. `Temp` belongs to
/// the store and is removed when the store is dropped, whether the run
/// succeeded, failed or panicked.
#[derive(Debug)]
pub(crate) enum WorkDir {
    Borrowed(PathBuf),
    Temp(TempDir),
}

impl WorkDir {
    /// Create a fresh store-owned temporary directory.
    pub(crate) fn temp() -> Result<Self, StoreError> {
        tempfile::Builder::new()
            .prefix("gitimpart-")
            .tempdir()
            .map(WorkDir::Temp)
            .map_err(|e| StoreError::Io {
                path: std::env::temp_dir(),
                source: e,
            })
    }

    pub(crate) fn path(&self) -> &Path {
        match self {
            WorkDir::Borrowed(path) => path,
            WorkDir::Temp(dir) => dir.path(),
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Create `dir` and its parents.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(io_err(dir))
}

/// Write `content` to `root/path`, creating parent directories.
pub(crate) fn put_file(root: &Path, path: &str, content: &[u8]) -> Result<(), StoreError> {
    let target = resolve_path(root, path)?;
    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    fs::write(&target, content).map_err(io_err(&target))
}

pub(crate) fn get_file(root: &Path, path: &str) -> Result<Option<String>, StoreError> {
    let target = resolve_path(root, path)?;
    match fs::read_to_string(&target) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(&target)(e)),
    }
}

pub(crate) fn list_dir(root: &Path, path: &str) -> Result<Vec<String>, StoreError> {
    let target = resolve_path(root, path)?;
    let entries = match fs::read_dir(&target) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(&target)(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_err(&target))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != ".git" {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

pub(crate) fn delete_path(root: &Path, path: &str) -> Result<(), StoreError> {
    let target = resolve_path(root, path)?;
    let result = if target.is_dir() {
        fs::remove_dir_all(&target)
    } else {
        fs::remove_file(&target)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(&target)(e)),
    }
}
