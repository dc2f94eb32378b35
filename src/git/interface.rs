//! git::interface
//!
//! The `Git` struct and all git2 operations.
//!
//! # Design
//!
//! `Git` wraps a git2 repository that has a working directory. Network
//! operations (clone, fetch, push) take [`Credentials`] and install an
//! HTTPS basic-auth callback; every other method works on local state only.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// A branch we were asked to create already exists with other history.
    #[error("ref conflict on {refname}: {message}")]
    RefConflict {
        /// The conflicting ref
        refname: String,
        /// What the conflict is
        message: String,
    },

    /// Clone, fetch or push failed, or the remote rejected an update.
    #[error("{operation} failed: {message}")]
    Transport {
        /// "clone", "fetch" or "push"
        operation: &'static str,
        /// Description of the failure
        message: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// An existing clone tracks a different repository.
    #[error("{path} is a clone of {found}, not {expected}")]
    OriginMismatch {
        /// The reused clone
        path: PathBuf,
        /// URL the caller asked for
        expected: String,
        /// URL the clone's origin points at
        found: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn transport(operation: &'static str, err: git2::Error) -> Self {
        GitError::Transport {
            operation,
            message: err.message().to_string(),
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// HTTPS basic-auth credential pair.
///
/// The username can be any non-empty identity; the token is the password.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// The remote every clone talks to.
pub const ORIGIN: &str = "origin";

/// Build remote callbacks that answer one credential request.
///
/// libgit2 calls the credential callback again when the server rejects the
/// previous answer; the second call fails the operation instead of looping.
fn auth_callbacks<'a>(creds: &'a Credentials, attempts: &'a Cell<u32>) -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(move |_url, _username_from_url, _allowed| {
        let n = attempts.get();
        attempts.set(n + 1);
        if n > 0 {
            return Err(git2::Error::from_str(
                "authentication failed: the remote rejected the supplied credentials",
            ));
        }
        git2::Cred::userpass_plaintext(&creds.username, &creds.token)
    });
    callbacks
}

/// The main Git interface.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open the repository whose working directory is exactly `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository root
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Clone `url` into `into`.
    ///
    /// # Errors
    ///
    /// - [`GitError::Transport`] if the clone fails for any reason
    pub fn clone(url: &str, into: &Path, creds: &Credentials) -> Result<Self, GitError> {
        info!(url, path = %into.display(), "cloning");

        let attempts = Cell::new(0);
        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(auth_callbacks(creds, &attempts));

        let repo = git2::build::RepoBuilder::new()
            .fetch_options(fetch)
            .clone(url, into)
            .map_err(|e| GitError::transport("clone", e))?;

        Ok(Self { repo })
    }

    /// Open `path` if it holds a repository, clone `url` into it otherwise.
    ///
    /// # Errors
    ///
    /// - [`GitError::OriginMismatch`] if the existing clone's origin is not `url`
    /// - [`GitError::Transport`] if the clone or fetch fails
    pub fn open_or_clone(url: &str, path: &Path, creds: &Credentials) -> Result<Self, GitError> {
        if path.join(".git").exists() {
            debug!(path = %path.display(), "reusing existing clone");
            let git = Self::open(path)?;
            let found = git.origin_url()?;
            if !same_url(&found, url) {
                return Err(GitError::OriginMismatch {
                    path: path.to_path_buf(),
                    expected: url.to_string(),
                    found,
                });
            }
            git.fetch(creds)?;
            Ok(git)
        } else {
            Self::clone(url, path, creds)
        }
    }

    /// URL configured for origin, or an empty string when there is none.
    pub fn origin_url(&self) -> Result<String, GitError> {
        match self.repo.find_remote(ORIGIN) {
            Ok(remote) => Ok(remote.url().unwrap_or_default().to_string()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(String::new()),
            Err(e) => Err(GitError::from_git2(e, ORIGIN)),
        }
    }

    /// The working directory root.
    pub fn workdir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Fetch all branches from origin into `refs/remotes/origin/*`.
    pub fn fetch(&self, creds: &Credentials) -> Result<(), GitError> {
        debug!(remote = ORIGIN, "fetching");

        let mut remote = self
            .repo
            .find_remote(ORIGIN)
            .map_err(|e| GitError::transport("fetch", e))?;

        let attempts = Cell::new(0);
        let mut opts = git2::FetchOptions::new();
        opts.remote_callbacks(auth_callbacks(creds, &attempts));

        let refspec = format!("+refs/heads/*:refs/remotes/{}/*", ORIGIN);
        remote
            .fetch(&[refspec.as_str()], Some(&mut opts), None)
            .map_err(|e| GitError::transport("fetch", e))
    }

    /// Push `branch` to the same name on origin.
    ///
    /// # Errors
    ///
    /// - [`GitError::Transport`] if the push fails or the remote rejects
    ///   the ref update
    pub fn push(&self, branch: &BranchName, creds: &Credentials) -> Result<(), GitError> {
        let refname = RefName::for_branch(branch);
        info!(remote = ORIGIN, branch = %branch, "pushing");

        let mut remote = self
            .repo
            .find_remote(ORIGIN)
            .map_err(|e| GitError::transport("push", e))?;

        let attempts = Cell::new(0);
        let rejected: RefCell<Option<String>> = RefCell::new(None);

        let mut callbacks = auth_callbacks(creds, &attempts);
        callbacks.push_update_reference(|name, status| {
            if let Some(message) = status {
                *rejected.borrow_mut() = Some(format!("{} rejected: {}", name, message));
            }
            Ok(())
        });

        let mut opts = git2::PushOptions::new();
        opts.remote_callbacks(callbacks);

        let refspec = format!("{0}:{0}", refname);
        remote
            .push(&[refspec.as_str()], Some(&mut opts))
            .map_err(|e| GitError::transport("push", e))?;

        if let Some(message) = rejected.borrow_mut().take() {
            return Err(GitError::Transport {
                operation: "push",
                message,
            });
        }

        Ok(())
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a ref to its target commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let oid = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if `ancestor` is an ancestor of `descendant`.
    ///
    /// Returns true if ancestor == descendant (a commit is its own ancestor).
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        if ancestor == descendant {
            return Ok(true);
        }

        let ancestor_oid = to_git2(ancestor)?;
        let descendant_oid = to_git2(descendant)?;

        self.repo
            .graph_descendant_of(descendant_oid, ancestor_oid)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })
    }

    // =========================================================================
    // Working Tree
    // =========================================================================

    /// Point local `branch` at `target`, make it HEAD and force the
    /// working tree to match, removing untracked files.
    pub fn checkout_branch_at(&self, branch: &BranchName, target: &Oid) -> Result<(), GitError> {
        let commit = self
            .repo
            .find_commit(to_git2(target)?)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;

        // Detach first so the branch can be reset even if it is checked out.
        self.repo.set_head_detached(commit.id())?;
        self.repo.branch(branch.as_str(), &commit, true)?;
        self.repo.set_head(RefName::for_branch(branch).as_str())?;

        debug!(branch = %branch, at = %target.short(7), "checked out");
        Ok(())
    }

    /// Stage every working tree change (additions, modifications, deletions).
    ///
    /// Returns the number of staged changes relative to HEAD.
    pub fn stage_all(&self) -> Result<usize, GitError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        let head_tree = self.head_tree()?;
        let diff = self
            .repo
            .diff_tree_to_index(Some(&head_tree), Some(&index), None)?;
        Ok(diff.deltas().len())
    }

    /// Commit the index on top of HEAD and return the new commit.
    pub fn commit(&self, message: &str, author_name: &str, author_email: &str) -> Result<Oid, GitError> {
        let mut index = self.repo.index()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        let signature = git2::Signature::now(author_name, author_email)?;
        let parent = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Patch text of every pending change (including untracked files)
    /// against HEAD.
    pub fn pending_diff(&self) -> Result<String, GitError> {
        let head_tree = self.head_tree()?;

        let mut opts = git2::DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))?;

        let mut patch = String::new();
        diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(patch)
    }

    fn head_tree(&self) -> Result<git2::Tree<'_>, GitError> {
        self.repo
            .head()
            .and_then(|h| h.peel_to_tree())
            .map_err(|e| GitError::from_git2(e, "HEAD"))
    }
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

fn to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}
