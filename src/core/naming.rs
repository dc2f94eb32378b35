//! core::naming
//!
//! Naming rules for change branches.
//!
//! A change branch holds one delivery before it is merged through a pull
//! request. Names combine a slug of the run id with a second-resolution
//! timestamp so consecutive runs do not collide:
//! `gitimpart/<slug>-<YYYYmmddHHMMSS>`.

use chrono::{DateTime, Utc};

use super::types::{BranchName, TypeError};

/// Namespace prefix for every branch this tool creates.
pub const BRANCH_PREFIX: &str = "gitimpart";

/// Timestamp layout used in change branch names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Generate a slug suitable for a branch name component.
///
/// - Lowercase
/// - Spaces, underscores and dots become hyphens
/// - Other invalid characters are dropped
/// - Truncated to a reasonable length
///
/// # Example
///
/// ```
/// use gitimpart::core::naming::slugify;
///
/// assert_eq!(slugify("My App"), "my-app");
/// assert_eq!(slugify("deploy.template"), "deploy-template");
/// ```
pub fn slugify(id: &str) -> String {
    let first_line = id.lines().next().unwrap_or("");

    first_line
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if matches!(c, ' ' | '_' | '.' | '-') {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(50)
        .collect()
}

/// Build the change branch name for a run.
///
/// # Errors
///
/// Returns `TypeError::InvalidBranchName` if `id` slugifies to nothing.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use gitimpart::core::naming::change_branch;
///
/// let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// let branch = change_branch("app", at).unwrap();
/// assert_eq!(branch.as_str(), "gitimpart/app-20240102030405");
/// ```
pub fn change_branch(id: &str, at: DateTime<Utc>) -> Result<BranchName, TypeError> {
    let slug = slugify(id);
    if slug.is_empty() {
        return Err(TypeError::InvalidBranchName(format!(
            "run id '{id}' has no usable characters"
        )));
    }
    BranchName::new(format!(
        "{}/{}-{}",
        BRANCH_PREFIX,
        slug,
        at.format(TIMESTAMP_FORMAT)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("test.kustomize"), "test-kustomize");
        assert_eq!(slugify("  spaced  out "), "spaced-out");
    }

    #[test]
    fn slugify_removes_invalid_chars() {
        assert_eq!(slugify("app [wip]"), "app-wip");
        assert_eq!(slugify("a/b"), "ab");
    }

    #[test]
    fn slugify_handles_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn change_branch_is_timestamped() {
        let at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        let branch = change_branch("My Service", at).unwrap();
        assert_eq!(branch.as_str(), "gitimpart/my-service-20231231235958");
    }

    #[test]
    fn change_branch_differs_per_second() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
        assert_ne!(change_branch("x", a).unwrap(), change_branch("x", b).unwrap());
    }

    #[test]
    fn change_branch_rejects_empty_slug() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(change_branch("???", at).is_err());
    }
}
