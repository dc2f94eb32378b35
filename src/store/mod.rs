//! store
//!
//! Transactional content stores: materialize a file tree somewhere, then
//! commit it.
//!
//! # Variants
//!
//! - [`LocalStore`]: a fixed directory under `.gitimpart/`, no version control
//! - [`GitStore`]: a clone with base-branch checkout, optional change branch,
//!   staging, commit and push
//! - [`PullRequestStore`]: a `GitStore` that opens a pull request after the
//!   push
//!
//! # Lifecycle
//!
//! A store is built once per run, used for one [`Store::transact`] and one
//! [`Store::commit`], then dropped. `transact` only touches the local
//! filesystem; `commit` is the single step that changes remote state.
//!
//! # Example
//!
//! ```ignore
//! let mut store = store::make("app", Utc::now(), Some(&delegate), &settings, &StoreOptions::default())?;
//! store.transact(&mut |dir| write_tree(&tree, dir, None))?;
//! match store.commit("Update app", "")? {
//!     CommitOutcome::NoChanges => println!("nothing to do"),
//!     outcome => println!("{outcome}"),
//! }
//! ```

pub mod git;
pub mod local;
pub mod pull_request;
mod workdir;

pub use git::{GitStore, GitStoreConfig};
pub use local::LocalStore;
pub use pull_request::PullRequestStore;

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::core::config::{ConfigError, Delegate, Settings, BOT_USERNAME};
use crate::core::naming::change_branch;
use crate::core::remote::{clone_subdir, parse_owner_repo, repo_url};
use crate::core::types::{BranchName, Oid};
use crate::forge::github::GitHubForge;
use crate::forge::{ForgeError, PullRequest};
use crate::git::{Credentials, GitError};
use crate::kustomize::KustomizeError;
use crate::render::ContentError;

/// Base branch used when neither the target nor the environment names one.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Kustomize(#[from] KustomizeError),

    #[error(transparent)]
    Content(#[from] ContentError),

    /// The pull request could not be opened. The branch is already pushed.
    #[error("{branch} was pushed but the pull request could not be opened: {source}")]
    PullRequest {
        branch: String,
        source: ForgeError,
    },

    #[error("invalid path '{0}': must be relative and must not contain '..'")]
    InvalidPath(String),

    #[error("commit called before transact")]
    NotTransacted,

    #[error("{operation} is not supported by the {store} store")]
    Unsupported {
        store: &'static str,
        operation: &'static str,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Paths touched by a write transaction, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    pub added_or_modified_files: Vec<String>,
}

impl RenderResult {
    /// Record `path` unless it is already recorded.
    pub fn touch(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.added_or_modified_files.contains(&path) {
            self.added_or_modified_files.push(path);
        }
    }
}

/// What a commit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The store has no version control; nothing to commit.
    Unversioned,
    /// The working tree matched HEAD. No commit, no push, no pull request.
    NoChanges,
    Committed {
        oid: Oid,
        branch: BranchName,
        pushed: bool,
        pull_request: Option<PullRequest>,
    },
}

impl std::fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitOutcome::Unversioned => write!(f, "written (no version control)"),
            CommitOutcome::NoChanges => write!(f, "no changes"),
            CommitOutcome::Committed {
                oid,
                branch,
                pushed,
                pull_request,
            } => {
                write!(f, "committed {} on {}", oid.short(7), branch)?;
                if *pushed {
                    write!(f, ", pushed")?;
                }
                if let Some(pr) = pull_request {
                    write!(f, ", opened pull request {}", pr)?;
                }
                Ok(())
            }
        }
    }
}

/// Write callback handed to [`Store::transact`].
pub type WriteFn<'a> = dyn FnMut(&Path) -> Result<RenderResult, StoreError> + 'a;

/// Uniform "write a tree, then commit it" contract.
pub trait Store {
    /// Variant name for logs and errors.
    fn name(&self) -> &'static str;

    /// Write `content` to `path`, creating parent directories.
    fn put(&mut self, path: &str, content: &str) -> Result<(), StoreError>;

    /// Sorted entry names directly under `path` (empty if absent).
    fn list(&mut self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Content of `path`, or `None` if absent.
    fn get(&mut self, path: &str) -> Result<Option<String>, StoreError>;

    /// Remove `path`. An absent path is not an error.
    fn delete(&mut self, path: &str) -> Result<(), StoreError>;

    /// Run `write` exactly once with a directory that exists for the
    /// duration of the call. Errors from `write` are returned unchanged and
    /// nothing is committed.
    fn transact(&mut self, write: &mut WriteFn<'_>) -> Result<RenderResult, StoreError>;

    /// Persist what `transact` wrote. `subject` and `body` form the commit
    /// message where one exists.
    fn commit(&mut self, subject: &str, body: &str) -> Result<CommitOutcome, StoreError>;

    /// Commit subject used when the caller supplies none.
    fn default_subject(&self) -> String {
        format!("gitimpart: update {}", self.name())
    }

    /// Patch of uncommitted changes, for stores that can produce one.
    fn pending_diff(&mut self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }
}

/// Join a repository-relative `path` onto `root`.
///
/// # Errors
///
/// `StoreError::InvalidPath` for absolute paths and paths containing `..`.
pub(crate) fn resolve_path(root: &Path, path: &str) -> Result<PathBuf, StoreError> {
    let rel = Path::new(path);
    let valid = rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !valid {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(root.join(rel))
}

/// Per-run knobs that do not come from the target file.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Clone location; overrides `GITIMPART_GIT_ROOT`.
    pub work_dir: Option<PathBuf>,
    /// Commit locally but never push or open a pull request.
    pub dry_run: bool,
}

/// Build the store a delivery target asks for.
///
/// - no target → [`LocalStore`] at `.gitimpart/<id>`
/// - `[git]` → [`GitStore`] on the base branch
/// - `[git]` + `[pull_request]` → [`PullRequestStore`] on a fresh
///   `gitimpart/<id>-<timestamp>` branch
///
/// # Errors
///
/// - `ConfigError::MissingCredential` if a git target is used without a token
/// - `ConfigError::InvalidRepository` if the repository cannot be normalized
pub fn make(
    id: &str,
    at: DateTime<Utc>,
    delegate: Option<&Delegate>,
    settings: &Settings,
    options: &StoreOptions,
) -> Result<Box<dyn Store>, StoreError> {
    if let Some(delegate) = delegate {
        delegate.validate()?;
    }
    let Some(git) = delegate.and_then(|d| d.git.as_ref()) else {
        return Ok(Box::new(LocalStore::new(id)?));
    };
    let wants_pr = delegate.is_some_and(|d| d.pull_request.is_some());

    let token = settings
        .token
        .clone()
        .ok_or_else(|| ConfigError::MissingCredential {
            env: settings.token_env.clone(),
        })?;

    let repository_url = repo_url(&git.repo, &settings.github_base_url)?;

    let base = git
        .branch
        .clone()
        .filter(|b| !b.is_empty())
        .or_else(|| settings.base_branch.clone())
        .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string());
    let base_branch = BranchName::new(base)
        .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let new_branch = if wants_pr {
        Some(change_branch(id, at).map_err(|e| ConfigError::InvalidValue(e.to_string()))?)
    } else {
        None
    };

    let config = GitStoreConfig {
        auth: Credentials::new(BOT_USERNAME, token.clone()),
        token_env: settings.token_env.clone(),
        base_branch,
        new_branch,
        repository_url: repository_url.clone(),
        author_name: settings.author_name.clone(),
        author_email: settings.author_email.clone(),
        work_dir: work_dir_for(&repository_url, settings, options)?,
        subdir: git.path.clone(),
        push: git.push && !options.dry_run,
    };
    debug!(store = if wants_pr { "pull_request" } else { "git" }, ?config, "making store");
    let git_store = GitStore::new(config)?;

    if !wants_pr {
        return Ok(Box::new(git_store));
    }

    let (owner, name) = parse_owner_repo(&repository_url)
        .ok_or_else(|| ConfigError::InvalidRepository(repository_url.clone()))?;
    let forge = GitHubForge::with_api_base(token, owner, name, settings.github_api_base());

    Ok(Box::new(
        PullRequestStore::new(git_store, Box::new(forge)).dry_run(options.dry_run),
    ))
}

/// Clone location for `repository_url`.
///
/// An explicit work dir is used as is. Under `GITIMPART_GIT_ROOT` every
/// repository gets its own `HOST/OWNER/NAME` subdirectory.
fn work_dir_for(
    repository_url: &str,
    settings: &Settings,
    options: &StoreOptions,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(dir) = &options.work_dir {
        return Ok(Some(dir.clone()));
    }
    let Some(root) = &settings.git_root else {
        return Ok(None);
    };
    let subdir = clone_subdir(repository_url)
        .ok_or_else(|| ConfigError::InvalidRepository(repository_url.to_string()))?;
    Ok(Some(root.join(subdir)))
}
