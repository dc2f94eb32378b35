//! core::remote
//!
//! Repository URL conventions.
//!
//! Users name a target repository in whatever form is convenient; the git
//! layer always receives a normalized `https://` URL, and the pull-request
//! layer derives `(owner, name)` back out of it.

use std::path::PathBuf;

use super::config::ConfigError;

/// Normalize a repository reference into a clone URL.
///
/// - `OWNER/NAME` → `<base_url>OWNER/NAME.git`
/// - `HOST/OWNER/NAME` → `https://HOST/OWNER/NAME.git`
/// - `https://...` → unchanged
///
/// `base_url` must end with `/` (see [`Settings::github_base_url`]).
///
/// # Errors
///
/// Returns `ConfigError::InvalidRepository` for any other shape.
///
/// # Example
///
/// ```
/// use gitimpart::core::remote::repo_url;
///
/// let url = repo_url("mumoshu/example", "https://github.com/").unwrap();
/// assert_eq!(url, "https://github.com/mumoshu/example.git");
///
/// let url = repo_url("ghe.example.com/team/app", "https://github.com/").unwrap();
/// assert_eq!(url, "https://ghe.example.com/team/app.git");
/// ```
///
/// [`Settings::github_base_url`]: crate::core::config::Settings::github_base_url
pub fn repo_url(repo: &str, base_url: &str) -> Result<String, ConfigError> {
    if repo.starts_with("https://") {
        return Ok(repo.to_string());
    }

    let segments: Vec<&str> = repo.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) || repo.contains("://") {
        return Err(ConfigError::InvalidRepository(repo.to_string()));
    }

    match segments.len() {
        2 => Ok(format!("{}{}.git", base_url, repo)),
        3 => Ok(format!("https://{}.git", repo)),
        _ => Err(ConfigError::InvalidRepository(repo.to_string())),
    }
}

/// Extract `(owner, name)` from a repository URL.
///
/// Takes the last two path segments and strips a trailing `.git`.
/// Returns `None` if fewer than two segments are present.
///
/// # Example
///
/// ```
/// use gitimpart::core::remote::parse_owner_repo;
///
/// assert_eq!(
///     parse_owner_repo("https://github.com/mumoshu/example.git"),
///     Some(("mumoshu".to_string(), "example".to_string()))
/// );
/// assert_eq!(parse_owner_repo("example"), None);
/// ```
pub fn parse_owner_repo(url: &str) -> Option<(String, String)> {
    let trimmed = url.trim_end_matches('/');
    let mut segments = trimmed.rsplit(['/', ':']);

    let repo = segments.next()?;
    let owner = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}

/// Relative directory for a clone of `url`: `HOST/OWNER/NAME`.
///
/// Gives every repository its own place under a shared clone root.
/// Returns `None` if the URL has fewer than two segments or a `.`/`..`
/// segment.
pub fn clone_subdir(url: &str) -> Option<PathBuf> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut dir = PathBuf::new();
    for segment in rest.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return None;
        }
        dir.push(segment);
    }
    (dir.components().count() >= 2).then_some(dir)
}
