//! push
//!
//! The write phase and the render-to-store pipeline.
//!
//! [`write_tree`] materializes a [`ContentTree`] under a directory: every
//! file first, then one kustomize registration per aggregation directory.
//! [`deliver`] runs it inside a store transaction and commits the result.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::core::config::{Delegate, GitTarget, Settings};
use crate::kustomize::Kustomize;
use crate::render::ContentTree;
use crate::store::{self, resolve_path, CommitOutcome, RenderResult, Store, StoreError, StoreOptions};

/// Per-delivery knobs.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Commit subject. `None` uses [`Store::default_subject`].
    pub subject: Option<String>,
    /// Commit body. `None` is an empty body.
    pub body: Option<String>,
    /// Kustomize executable override.
    pub kustomize_bin: Option<PathBuf>,
    pub store: StoreOptions,
}

/// What a delivery wrote and what the commit did with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub written: RenderResult,
    /// Patch of what was about to be committed; dry runs only.
    pub pending: Option<String>,
    pub outcome: CommitOutcome,
}

/// Write `tree` under `root`.
///
/// Aggregation members not yet merged into the file set are written too.
/// Kustomize is resolved once, and only if the tree has an aggregation
/// directory.
///
/// # Errors
///
/// - `StoreError::InvalidPath` for paths escaping `root`
/// - `StoreError::Content` when a file cannot be serialized for its extension
/// - `StoreError::Kustomize` when the tool is missing or fails
pub fn write_tree(
    tree: &ContentTree,
    root: &Path,
    kustomize_bin: Option<&Path>,
) -> Result<RenderResult, StoreError> {
    let mut tree = tree.clone();
    tree.expand_kustomize();

    let mut result = RenderResult::default();
    for (path, content) in &tree.files {
        let target = resolve_path(root, path)?;
        let bytes = content.serialize_for(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&target, bytes).map_err(|e| StoreError::Io {
            path: target.clone(),
            source: e,
        })?;
        debug!(path = %path, "wrote file");
        result.touch(path.as_str());
    }

    let aggregations: Vec<_> = tree.aggregations().collect();
    if !aggregations.is_empty() {
        let kustomize = Kustomize::resolve(kustomize_bin)?;
        for (dir, members) in aggregations {
            resolve_path(root, dir)?;
            for path in kustomize.register(root, dir, members)? {
                result.touch(path);
            }
        }
    }

    info!(files = result.added_or_modified_files.len(), "wrote content tree");
    Ok(result)
}

/// Write `tree` into `store` and commit it.
///
/// Nothing is committed when the write fails. On a dry run the pending
/// patch is captured between the write and the commit.
pub fn deliver(
    tree: &ContentTree,
    store: &mut dyn Store,
    options: &PushOptions,
) -> Result<Delivery, StoreError> {
    let kustomize_bin = options.kustomize_bin.as_deref();
    let written = store.transact(&mut |root| write_tree(tree, root, kustomize_bin))?;
    let pending = if options.store.dry_run {
        store.pending_diff()?
    } else {
        None
    };

    let subject = options
        .subject
        .clone()
        .unwrap_or_else(|| store.default_subject());
    let body = options.body.as_deref().unwrap_or("");
    debug!(store = store.name(), %subject, "committing");
    let outcome = store.commit(&subject, body)?;

    Ok(Delivery {
        written,
        pending,
        outcome,
    })
}

/// Deliver `tree` straight to `branch` of `repo`.
///
/// `repo` takes any form [`crate::core::remote::repo_url`] accepts. The
/// kustomize override falls back to `settings.kustomize_bin`.
pub fn push(
    tree: &ContentTree,
    repo: &str,
    branch: &str,
    settings: &Settings,
    options: &PushOptions,
) -> Result<Delivery, StoreError> {
    let delegate = Delegate {
        git: Some(GitTarget {
            repo: repo.to_string(),
            branch: Some(branch.to_string()),
            path: None,
            push: true,
        }),
        pull_request: None,
    };
    let mut store = store::make("push", Utc::now(), Some(&delegate), settings, &options.store)?;

    let mut options = options.clone();
    if options.kustomize_bin.is_none() {
        options.kustomize_bin = settings.kustomize_bin.clone();
    }
    deliver(tree, store.as_mut(), &options)
}
