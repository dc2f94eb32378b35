//! core::config::schema
//!
//! Delivery target schema.
//!
//! A target file says where rendered content goes. Without a `[git]` table
//! the content stays in the local store; with `[pull_request]` the change is
//! delivered through a pull request instead of a direct push.
//!
//! ```toml
//! [git]
//! repo = "owner/name"
//! branch = "main"
//! path = "deploy/app"
//! push = true
//!
//! [pull_request]
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Where and how a rendered tree is delivered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Delegate {
    /// Target repository. `None` keeps the content local.
    pub git: Option<GitTarget>,

    /// Deliver through a pull request. `branch` of [`GitTarget`] becomes
    /// the base branch and a fresh change branch is pushed.
    pub pull_request: Option<PullRequestTarget>,
}

/// The repository that receives the content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitTarget {
    /// `OWNER/NAME`, `HOST/OWNER/NAME`, or an `https://` URL.
    pub repo: String,

    /// Base branch. Empty falls back to the environment, then `main`.
    pub branch: Option<String>,

    /// Subdirectory of the clone handed to the write step.
    pub path: Option<String>,

    /// Push the commit. When false the clone is committed locally only.
    pub push: bool,
}

/// Marker table; its presence selects pull-request delivery.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PullRequestTarget {}

impl Delegate {
    /// Validate the target values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(git) = &self.git {
            if git.repo.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git.repo cannot be empty".into(),
                ));
            }
            if let Some(branch) = git.branch.as_deref().filter(|b| !b.is_empty()) {
                BranchName::new(branch)
                    .map_err(|e| ConfigError::InvalidValue(format!("git.branch: {}", e)))?;
            }
            if let Some(path) = &git.path {
                if path.starts_with('/') || path.split('/').any(|c| c == "..") {
                    return Err(ConfigError::InvalidValue(format!(
                        "git.path must be relative to the repository root: {}",
                        path
                    )));
                }
            }
        } else if self.pull_request.is_some() {
            return Err(ConfigError::InvalidValue(
                "pull_request requires a [git] target".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local() {
        let delegate = Delegate::default();
        assert!(delegate.git.is_none());
        assert!(delegate.pull_request.is_none());
        assert!(delegate.validate().is_ok());
    }

    #[test]
    fn parses_full_target() {
        let delegate: Delegate = toml::from_str(
            r#"
            [git]
            repo = "owner/name"
            branch = "main"
            path = "deploy/app"
            push = true

            [pull_request]
            "#,
        )
        .unwrap();

        let git = delegate.git.as_ref().unwrap();
        assert_eq!(git.repo, "owner/name");
        assert_eq!(git.branch.as_deref(), Some("main"));
        assert_eq!(git.path.as_deref(), Some("deploy/app"));
        assert!(git.push);
        assert!(delegate.pull_request.is_some());
        assert!(delegate.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed: Result<Delegate, _> = toml::from_str("[git]\nrepo = \"a/b\"\nforce = true\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_pull_request_without_git() {
        let delegate = Delegate {
            git: None,
            pull_request: Some(PullRequestTarget {}),
        };
        assert!(delegate.validate().is_err());
    }

    #[test]
    fn rejects_escaping_path() {
        let delegate = Delegate {
            git: Some(GitTarget {
                repo: "a/b".into(),
                path: Some("../outside".into()),
                ..Default::default()
            }),
            pull_request: None,
        };
        assert!(delegate.validate().is_err());
    }

    #[test]
    fn rejects_invalid_branch() {
        let delegate = Delegate {
            git: Some(GitTarget {
                repo: "a/b".into(),
                branch: Some("bad..branch".into()),
                ..Default::default()
            }),
            pull_request: None,
        };
        assert!(delegate.validate().is_err());
    }
}
