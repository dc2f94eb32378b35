//! store::pull_request
//!
//! A [`GitStore`] that opens a pull request after its commit is pushed.
//!
//! Writing and committing are delegated unchanged. After the git commit the
//! store opens a pull request from the change branch to the base branch,
//! titled with the commit subject and described with the commit body.
//!
//! A pull-request failure is reported after the branch was already pushed;
//! the push is not rolled back.

use std::io::Write;

use tracing::{info, warn};

use super::{CommitOutcome, GitStore, RenderResult, Store, StoreError, WriteFn};
use crate::core::config::ConfigError;
use crate::forge::{CreatePrRequest, Forge};

pub struct PullRequestStore {
    git: GitStore,
    forge: Box<dyn Forge>,
    dry_run: bool,
    preview: Box<dyn Write + Send>,
}

impl std::fmt::Debug for PullRequestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullRequestStore")
            .field("git", &self.git)
            .field("forge", &self.forge.name())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl PullRequestStore {
    pub fn new(git: GitStore, forge: Box<dyn Forge>) -> Self {
        Self {
            git,
            forge,
            dry_run: false,
            preview: Box::new(std::io::stdout()),
        }
    }

    /// Print the would-be pull request instead of opening it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Where the dry-run preview is written (stdout by default).
    pub fn preview_to(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.preview = sink;
        self
    }

    fn request(&self, subject: &str, body: &str) -> Result<CreatePrRequest, StoreError> {
        let head = self.git.new_branch().ok_or_else(|| {
            ConfigError::InvalidValue("pull-request delivery requires a change branch".into())
        })?;
        Ok(CreatePrRequest {
            head: head.to_string(),
            base: self.git.base_branch().to_string(),
            title: subject.to_string(),
            body: (!body.is_empty()).then(|| body.to_string()),
        })
    }

    fn write_preview(&mut self, request: &CreatePrRequest) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: "<preview>".into(),
            source,
        };
        writeln!(
            self.preview,
            "pull request (dry run): {} -> {}",
            request.head, request.base
        )
        .map_err(io_err)?;
        writeln!(self.preview, "title: {}", request.title).map_err(io_err)?;
        writeln!(self.preview, "body:\n{}", request.body.as_deref().unwrap_or("")).map_err(io_err)?;
        self.preview.flush().map_err(io_err)
    }

    fn open(&self, request: CreatePrRequest) -> Result<crate::forge::PullRequest, StoreError> {
        let head = request.head.clone();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Io {
                path: "<async runtime>".into(),
                source: e,
            })?;
        runtime
            .block_on(self.forge.create_pr(request))
            .map_err(|source| StoreError::PullRequest {
                branch: head,
                source,
            })
    }
}

impl Store for PullRequestStore {
    fn name(&self) -> &'static str {
        "pull_request"
    }

    fn put(&mut self, path: &str, content: &str) -> Result<(), StoreError> {
        self.git.put(path, content)
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, StoreError> {
        self.git.list(path)
    }

    fn get(&mut self, path: &str) -> Result<Option<String>, StoreError> {
        self.git.get(path)
    }

    fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        self.git.delete(path)
    }

    fn transact(&mut self, write: &mut WriteFn<'_>) -> Result<RenderResult, StoreError> {
        self.git.transact(write)
    }

    fn commit(&mut self, subject: &str, body: &str) -> Result<CommitOutcome, StoreError> {
        let request = self.request(subject, body)?;
        let outcome = self.git.commit(subject, body)?;

        if self.dry_run {
            if outcome == CommitOutcome::NoChanges {
                info!("nothing committed; no pull request to preview");
            } else {
                self.write_preview(&request)?;
            }
            return Ok(outcome);
        }

        match outcome {
            CommitOutcome::Committed {
                oid,
                branch,
                pushed: true,
                ..
            } => {
                let pr = self.open(request)?;
                info!(number = pr.number, url = %pr.url, "pull request opened");
                Ok(CommitOutcome::Committed {
                    oid,
                    branch,
                    pushed: true,
                    pull_request: Some(pr),
                })
            }
            CommitOutcome::Committed {
                oid,
                branch,
                pushed: false,
                pull_request,
            } => {
                warn!(branch = %branch, "push is disabled; not opening a pull request");
                Ok(CommitOutcome::Committed {
                    oid,
                    branch,
                    pushed: false,
                    pull_request,
                })
            }
            other => {
                info!("nothing committed; not opening a pull request");
                Ok(other)
            }
        }
    }

    fn default_subject(&self) -> String {
        self.git.default_subject()
    }

    fn pending_diff(&mut self) -> Result<Option<String>, StoreError> {
        self.git.pending_diff()
    }
}
