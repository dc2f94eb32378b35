//! store::git
//!
//! A store backed by a clone of a remote repository.
//!
//! # Transact
//!
//! 1. Clone the repository into the work dir (or reuse and fetch an
//!    existing clone there)
//! 2. Check out the base branch at `origin/<base>`
//! 3. If a change branch was requested, refuse when `origin/<new>` exists
//!    with history the base does not contain, then create it at the base
//! 4. Hand `<clone>/<subdir>` to the write function
//!
//! # Commit
//!
//! Stage everything, skip the commit entirely when nothing differs from
//! HEAD, otherwise commit and push the change branch (or the base branch).
//!
//! The work dir is either caller-owned (`work_dir`) or a temporary
//! directory dropped together with the store.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::workdir::{delete_path, ensure_dir, get_file, list_dir, put_file, WorkDir};
use super::{resolve_path, CommitOutcome, RenderResult, Store, StoreError, WriteFn};
use crate::core::config::ConfigError;
use crate::core::types::{BranchName, RefName};
use crate::git::{Credentials, Git, GitError, ORIGIN};

/// Everything a git store needs, resolved up front.
#[derive(Debug, Clone)]
pub struct GitStoreConfig {
    pub auth: Credentials,
    /// Environment variable the token was read from, for error messages.
    pub token_env: String,
    /// Branch to start from; also the push target when `new_branch` is `None`.
    pub base_branch: BranchName,
    /// Branch created from the base to hold the change.
    pub new_branch: Option<BranchName>,
    /// Normalized clone URL.
    pub repository_url: String,
    pub author_name: String,
    pub author_email: String,
    /// Clone location. `None` uses a temporary directory owned by the store.
    pub work_dir: Option<PathBuf>,
    /// Subdirectory of the clone handed to the write function.
    pub subdir: Option<String>,
    /// Push after committing.
    pub push: bool,
}

#[derive(Debug)]
pub struct GitStore {
    config: GitStoreConfig,
    workdir: Option<WorkDir>,
    repo: Option<Git>,
}

impl GitStore {
    /// Validate `config` without touching the filesystem or network.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingCredential` if the token is empty
    /// - `ConfigError::InvalidValue` if the username is empty
    /// - `StoreError::InvalidPath` if `subdir` escapes the clone
    pub fn new(config: GitStoreConfig) -> Result<Self, StoreError> {
        if config.auth.token.is_empty() {
            return Err(ConfigError::MissingCredential {
                env: config.token_env.clone(),
            }
            .into());
        }
        if config.auth.username.is_empty() {
            return Err(ConfigError::InvalidValue("git username cannot be empty".into()).into());
        }
        if let Some(subdir) = &config.subdir {
            resolve_path(Path::new(""), subdir)?;
        }

        Ok(Self {
            config,
            workdir: None,
            repo: None,
        })
    }

    pub fn base_branch(&self) -> &BranchName {
        &self.config.base_branch
    }

    pub fn new_branch(&self) -> Option<&BranchName> {
        self.config.new_branch.as_ref()
    }

    /// The branch commits land on and get pushed to.
    pub fn target_branch(&self) -> &BranchName {
        self.config
            .new_branch
            .as_ref()
            .unwrap_or(&self.config.base_branch)
    }

    pub fn repository_url(&self) -> &str {
        &self.config.repository_url
    }

    /// Root of the clone, once it exists.
    pub fn clone_dir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(WorkDir::path)
    }

    /// Clone or open the repository and check out the target branch, once.
    fn prepare(&mut self) -> Result<&Git, StoreError> {
        if self.repo.is_none() {
            let git = self.checkout()?;
            self.repo = Some(git);
        }
        self.repo.as_ref().ok_or(StoreError::NotTransacted)
    }

    fn checkout(&mut self) -> Result<Git, StoreError> {
        let workdir = match &self.config.work_dir {
            Some(dir) => {
                ensure_dir(dir)?;
                WorkDir::Borrowed(dir.clone())
            }
            None => WorkDir::temp()?,
        };
        let git = Git::open_or_clone(&self.config.repository_url, workdir.path(), &self.config.auth)?;
        self.workdir = Some(workdir);

        let base = &self.config.base_branch;
        let base_oid = git.resolve_ref(RefName::for_remote_branch(ORIGIN, base).as_str())?;

        match &self.config.new_branch {
            Some(new) => {
                let remote_new = RefName::for_remote_branch(ORIGIN, new);
                if let Some(existing) = git.try_resolve_ref(remote_new.as_str())? {
                    if !git.is_ancestor(&existing, &base_oid)? {
                        return Err(GitError::RefConflict {
                            refname: remote_new.to_string(),
                            message: format!(
                                "{} already exists on the remote and diverges from {}",
                                new, base
                            ),
                        }
                        .into());
                    }
                }
                git.checkout_branch_at(new, &base_oid)?;
                info!(base = %base, branch = %new, "created change branch");
            }
            None => {
                git.checkout_branch_at(base, &base_oid)?;
                info!(branch = %base, "checked out base branch");
            }
        }

        Ok(git)
    }

    /// Directory handed to writers: the clone root joined with `subdir`.
    fn scoped_root(&mut self) -> Result<PathBuf, StoreError> {
        let root = self.prepare()?.workdir()?.to_path_buf();
        match &self.config.subdir {
            Some(subdir) => resolve_path(&root, subdir),
            None => Ok(root),
        }
    }
}

/// `subject`, or `subject\n\nbody` when a body is given.
pub(crate) fn commit_message(subject: &str, body: &str) -> String {
    if body.is_empty() {
        subject.to_string()
    } else {
        format!("{}\n\n{}", subject, body)
    }
}

impl Store for GitStore {
    fn name(&self) -> &'static str {
        "git"
    }

    fn put(&mut self, path: &str, content: &str) -> Result<(), StoreError> {
        let root = self.scoped_root()?;
        put_file(&root, path, content.as_bytes())
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, StoreError> {
        let root = self.scoped_root()?;
        list_dir(&root, path)
    }

    fn get(&mut self, path: &str) -> Result<Option<String>, StoreError> {
        let root = self.scoped_root()?;
        get_file(&root, path)
    }

    fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        let root = self.scoped_root()?;
        delete_path(&root, path)
    }

    fn transact(&mut self, write: &mut WriteFn<'_>) -> Result<RenderResult, StoreError> {
        let root = self.scoped_root()?;
        ensure_dir(&root)?;
        debug!(root = %root.display(), "writing into clone");
        write(&root)
    }

    fn commit(&mut self, subject: &str, body: &str) -> Result<CommitOutcome, StoreError> {
        let git = self.repo.as_ref().ok_or(StoreError::NotTransacted)?;

        let staged = git.stage_all()?;
        if staged == 0 {
            info!(branch = %self.target_branch(), "no changes; skipping commit and push");
            return Ok(CommitOutcome::NoChanges);
        }

        let oid = git.commit(
            &commit_message(subject, body),
            &self.config.author_name,
            &self.config.author_email,
        )?;
        let branch = self.target_branch().clone();
        info!(%oid, branch = %branch, changes = staged, "committed");

        if self.config.push {
            git.push(&branch, &self.config.auth)?;
        } else {
            debug!(branch = %branch, "push disabled");
        }

        Ok(CommitOutcome::Committed {
            oid,
            branch,
            pushed: self.config.push,
            pull_request: None,
        })
    }

    /// The change branch name, or an update note for the base branch.
    fn default_subject(&self) -> String {
        match &self.config.new_branch {
            Some(branch) => branch.to_string(),
            None => format!("gitimpart: update {}", self.config.base_branch),
        }
    }

    fn pending_diff(&mut self) -> Result<Option<String>, StoreError> {
        let git = self.repo.as_ref().ok_or(StoreError::NotTransacted)?;
        Ok(Some(git.pending_diff()?))
    }
}
