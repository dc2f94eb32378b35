//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`, and nothing shells out to the git CLI.
//!
//! # Responsibilities
//!
//! - Clone, open and fetch over HTTPS basic auth
//! - Branch checkout and creation
//! - Staging, committing and pending-diff reporting
//! - Pushing, with remote-side rejections surfaced as errors
//!
//! # Example
//!
//! ```ignore
//! use gitimpart::git::{Credentials, Git};
//!
//! let creds = Credentials::new("gitimpartbot", token);
//! let git = Git::open_or_clone("https://github.com/owner/repo.git", dir, &creds)?;
//! let base = git.resolve_ref("refs/remotes/origin/main")?;
//! git.checkout_branch_at(&BranchName::new("main")?, &base)?;
//! ```

mod interface;

pub use interface::{Credentials, Git, GitError, ORIGIN};
