//! store::local
//!
//! Writes into `<cwd>/.gitimpart/<id>`. No version control; commit is a
//! no-op.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::workdir::{delete_path, ensure_dir, get_file, list_dir, put_file};
use super::{CommitOutcome, RenderResult, Store, StoreError, WriteFn};

/// Directory under the current directory that holds local stores.
pub const LOCAL_NAMESPACE: &str = ".gitimpart";

#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Store for `id` under the current working directory.
    pub fn new(id: &str) -> Result<Self, StoreError> {
        let cwd = std::env::current_dir().map_err(|e| StoreError::Io {
            path: PathBuf::from("."),
            source: e,
        })?;
        Self::in_dir(&cwd, id)
    }

    /// Store for `id` under `base` instead of the current directory.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidPath` unless `id` is a single plain path component.
    pub fn in_dir(base: &Path, id: &str) -> Result<Self, StoreError> {
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(Self {
                root: base.join(LOCAL_NAMESPACE).join(id),
            }),
            _ => Err(StoreError::InvalidPath(id.to_string())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Store for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn put(&mut self, path: &str, content: &str) -> Result<(), StoreError> {
        put_file(&self.root, path, content.as_bytes())
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, StoreError> {
        list_dir(&self.root, path)
    }

    fn get(&mut self, path: &str) -> Result<Option<String>, StoreError> {
        get_file(&self.root, path)
    }

    fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        delete_path(&self.root, path)
    }

    fn transact(&mut self, write: &mut WriteFn<'_>) -> Result<RenderResult, StoreError> {
        ensure_dir(&self.root)?;
        debug!(root = %self.root.display(), "writing local store");
        write(&self.root)
    }

    fn commit(&mut self, _subject: &str, _body: &str) -> Result<CommitOutcome, StoreError> {
        Ok(CommitOutcome::Unversioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transact_receives_namespaced_dir() {
        let base = tempfile::tempdir().unwrap();
        let mut store = LocalStore::in_dir(base.path(), "myapp").unwrap();

        let mut seen = None;
        store
            .transact(&mut |dir| {
                seen = Some(dir.to_path_buf());
                assert!(dir.is_dir());
                Ok(RenderResult::default())
            })
            .unwrap();

        assert_eq!(seen.unwrap(), base.path().join(".gitimpart").join("myapp"));
    }

    #[test]
    fn commit_is_noop() {
        let base = tempfile::tempdir().unwrap();
        let mut store = LocalStore::in_dir(base.path(), "x").unwrap();
        assert_eq!(store.commit("s", "b").unwrap(), CommitOutcome::Unversioned);
        assert!(!store.root().exists());
    }

    #[test]
    fn write_error_is_returned() {
        let base = tempfile::tempdir().unwrap();
        let mut store = LocalStore::in_dir(base.path(), "x").unwrap();
        let err = store
            .transact(&mut |_| Err(StoreError::InvalidPath("../bad".into())))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }

    #[test]
    fn data_operations_round_through_root() {
        let base = tempfile::tempdir().unwrap();
        let mut store = LocalStore::in_dir(base.path(), "x").unwrap();

        store.put("cfg/app.yaml", "k: v\n").unwrap();
        assert_eq!(store.list("cfg").unwrap(), vec!["app.yaml"]);
        assert_eq!(store.get("cfg/app.yaml").unwrap().as_deref(), Some("k: v\n"));
        assert!(store.root().join("cfg/app.yaml").is_file());

        store.delete("cfg/app.yaml").unwrap();
        assert_eq!(store.get("cfg/app.yaml").unwrap(), None);
    }

    #[test]
    fn id_must_stay_inside_namespace() {
        let base = tempfile::tempdir().unwrap();
        for bad in ["../x", "a/b", "/tmp/x", "..", ".", ""] {
            assert!(
                matches!(LocalStore::in_dir(base.path(), bad), Err(StoreError::InvalidPath(_))),
                "accepted {bad:?}"
            );
        }
        assert!(!base.path().join("x").exists());
    }
}
