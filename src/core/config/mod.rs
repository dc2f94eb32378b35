//! core::config
//!
//! Process-wide settings and delivery targets.
//!
//! # Overview
//!
//! Two inputs configure a run:
//! - **Settings**: values discovered from the environment once at startup
//!   (credential token, base branch default, clone root, commit identity, ...)
//! - **Delegate**: the delivery target, read from a TOML file or assembled
//!   from CLI flags
//!
//! Deeper layers receive `Settings` by reference and never read the
//! environment themselves.
//!
//! # Environment
//!
//! | Variable | Setting |
//! |---|---|
//! | `GITHUB_TOKEN` (name overridable) | credential token |
//! | `GITIMPART_GITHUB_ENTERPRISE_URL` | base URL for `OWNER/NAME` repos |
//! | `GITIMPART_BASE_BRANCH` | default base branch |
//! | `GITIMPART_GIT_ROOT` | default clone root |
//! | `GITIMPART_GIT_AUTHOR_NAME` / `_EMAIL` | commit identity |
//! | `GITHUB_REPOSITORY` | `OWNER/NAME` for `.template.` files |
//! | `GITIMPART_KUSTOMIZE_BIN` | kustomize override path |
//!
//! # Example
//!
//! ```
//! use gitimpart::core::config::Settings;
//!
//! let settings = Settings::from_lookup("GITHUB_TOKEN", |name| match name {
//!     "GITHUB_TOKEN" => Some("t0ken".to_string()),
//!     "GITIMPART_BASE_BRANCH" => Some("develop".to_string()),
//!     _ => None,
//! });
//! assert_eq!(settings.token.as_deref(), Some("t0ken"));
//! assert_eq!(settings.base_branch.as_deref(), Some("develop"));
//! assert_eq!(settings.github_base_url, "https://github.com/");
//! ```

pub mod schema;

pub use schema::{Delegate, GitTarget, PullRequestTarget};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default environment variable holding the credential token.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

pub const ENTERPRISE_URL_ENV: &str = "GITIMPART_GITHUB_ENTERPRISE_URL";
pub const BASE_BRANCH_ENV: &str = "GITIMPART_BASE_BRANCH";
pub const GIT_ROOT_ENV: &str = "GITIMPART_GIT_ROOT";
pub const AUTHOR_NAME_ENV: &str = "GITIMPART_GIT_AUTHOR_NAME";
pub const AUTHOR_EMAIL_ENV: &str = "GITIMPART_GIT_AUTHOR_EMAIL";
pub const REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
pub const KUSTOMIZE_BIN_ENV: &str = "GITIMPART_KUSTOMIZE_BIN";

/// Public GitHub base URL used when no enterprise URL is configured.
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://github.com/";

/// Bot identity used for basic auth. Any non-empty user works with a token.
pub const BOT_USERNAME: &str = "gitimpartbot";

const DEFAULT_AUTHOR_NAME: &str = "gitimpartbot";
const DEFAULT_AUTHOR_EMAIL: &str = "gitimpartbot@users.noreply.github.com";

/// Errors from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    /// An empty credential was supplied for a git-backed store.
    #[error("a credential token is required; set {env} to a valid GitHub token")]
    MissingCredential { env: String },

    /// A required environment discovery value is absent.
    #[error("{env} must be set: {reason}")]
    MissingEnv { env: &'static str, reason: String },

    #[error("invalid repository '{0}': expected OWNER/NAME, HOST/OWNER/NAME or an https:// URL")]
    InvalidRepository(String),
}

/// Environment snapshot taken once at process start.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Credential token for git transport and the pull-request API.
    pub token: Option<String>,
    /// Name of the variable the token was read from (for error messages).
    pub token_env: String,
    /// Base URL for `OWNER/NAME` repositories, always ending in `/`.
    pub github_base_url: String,
    /// Whether `github_base_url` came from the enterprise override.
    pub enterprise: bool,
    pub base_branch: Option<String>,
    pub git_root: Option<PathBuf>,
    pub author_name: String,
    pub author_email: String,
    /// `OWNER/NAME` of the repository running the tool.
    pub github_repository: Option<String>,
    pub kustomize_bin: Option<PathBuf>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("has_token", &self.token.is_some())
            .field("token_env", &self.token_env)
            .field("github_base_url", &self.github_base_url)
            .field("base_branch", &self.base_branch)
            .field("git_root", &self.git_root)
            .field("author_name", &self.author_name)
            .field("author_email", &self.author_email)
            .field("github_repository", &self.github_repository)
            .field("kustomize_bin", &self.kustomize_bin)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(DEFAULT_TOKEN_ENV, |_| None)
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env(token_env: &str) -> Self {
        Self::from_lookup(token_env, |name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup(token_env: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let enterprise_url = get(ENTERPRISE_URL_ENV);
        let enterprise = enterprise_url.is_some();
        let mut github_base_url =
            enterprise_url.unwrap_or_else(|| DEFAULT_GITHUB_BASE_URL.to_string());
        if !github_base_url.ends_with('/') {
            github_base_url.push('/');
        }

        Self {
            token: get(token_env),
            token_env: token_env.to_string(),
            github_base_url,
            enterprise,
            base_branch: get(BASE_BRANCH_ENV),
            git_root: get(GIT_ROOT_ENV).map(PathBuf::from),
            author_name: get(AUTHOR_NAME_ENV).unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            author_email: get(AUTHOR_EMAIL_ENV)
                .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string()),
            github_repository: get(REPOSITORY_ENV),
            kustomize_bin: get(KUSTOMIZE_BIN_ENV).map(PathBuf::from),
        }
    }

    /// REST API base for the configured GitHub host.
    ///
    /// `https://api.github.com` for github.com, `<base>/api/v3` for an
    /// enterprise server.
    pub fn github_api_base(&self) -> String {
        if self.enterprise {
            format!("{}api/v3", self.github_base_url)
        } else {
            "https://api.github.com".to_string()
        }
    }

    /// Split `GITHUB_REPOSITORY` into `(owner, name)`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingEnv` if the value is absent
    /// - `ConfigError::InvalidValue` if it is not `OWNER/NAME`
    pub fn repository_owner_and_name(&self) -> Result<(String, String), ConfigError> {
        let value = self.github_repository.as_deref().ok_or(ConfigError::MissingEnv {
            env: REPOSITORY_ENV,
            reason: "templates named *.template.* read github_repo_owner and github_repo_name \
                     from OWNER/REPO_NAME"
                .into(),
        })?;

        match value.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok((owner.to_string(), name.to_string()))
            }
            _ => Err(ConfigError::InvalidValue(format!(
                "{} must be OWNER/REPO_NAME, got '{}'",
                REPOSITORY_ENV, value
            ))),
        }
    }
}

/// Load and validate a delivery target file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_delegate(path: &Path) -> Result<Delegate, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let delegate: Delegate = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    delegate.validate()?;
    Ok(delegate)
}
