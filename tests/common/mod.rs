//! Shared fixtures for integration tests.
//!
//! [`Remote`] is a bare repository standing in for the hosted remote, plus
//! a seed clone used to shape its history with the git CLI.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use gitimpart::core::types::BranchName;
use gitimpart::git::Credentials;
use gitimpart::store::GitStoreConfig;

pub struct Remote {
    dir: TempDir,
}

impl Remote {
    /// A bare remote whose `main` holds one commit with `README.md`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let remote = Self { dir };

        run_git(remote.dir.path(), &["init", "--bare", "remote.git"]);
        std::fs::create_dir(remote.seed()).unwrap();
        run_git(&remote.seed(), &["init"]);
        run_git(&remote.seed(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(&remote.seed(), &["config", "user.email", "test@example.com"]);
        run_git(&remote.seed(), &["config", "user.name", "Test User"]);
        run_git(&remote.seed(), &["config", "commit.gpgsign", "false"]);
        std::fs::write(remote.seed().join("README.md"), "# Test Repo\n").unwrap();
        run_git(&remote.seed(), &["add", "README.md"]);
        run_git(&remote.seed(), &["commit", "-m", "Initial commit"]);
        run_git(&remote.seed(), &["remote", "add", "origin", &remote.url()]);
        run_git(&remote.seed(), &["push", "origin", "main"]);
        run_git(&remote.bare(), &["symbolic-ref", "HEAD", "refs/heads/main"]);

        remote
    }

    pub fn bare(&self) -> PathBuf {
        self.dir.path().join("remote.git")
    }

    pub fn seed(&self) -> PathBuf {
        self.dir.path().join("seed")
    }

    /// Clone URL of the bare repository.
    pub fn url(&self) -> String {
        self.bare().to_string_lossy().into_owned()
    }

    /// Push a branch holding one commit on top of `from`, a seed revision
    /// such as `origin/main`.
    pub fn push_branch(&self, name: &str, from: &str, file: &str, content: &str) {
        let seed = self.seed();
        run_git(&seed, &["fetch", "origin"]);
        run_git(&seed, &["checkout", "-B", name, from]);
        std::fs::write(seed.join(file), content).unwrap();
        run_git(&seed, &["add", file]);
        run_git(&seed, &["commit", "-m", &format!("Add {file}")]);
        run_git(&seed, &["push", "-f", "origin", &format!("HEAD:refs/heads/{name}")]);
        run_git(&seed, &["checkout", "--detach", "origin/main"]);
    }

    /// Push a branch pointing at `from` with no commits of its own.
    pub fn push_branch_at(&self, name: &str, from: &str) {
        run_git(&self.seed(), &["fetch", "origin"]);
        run_git(&self.seed(), &["push", "-f", "origin", &format!("{from}:refs/heads/{name}")]);
    }

    /// Commit OID of `rev` on the remote, if it resolves.
    pub fn rev(&self, rev: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("{rev}^{{commit}}")])
            .current_dir(self.bare())
            .output()
            .expect("git rev-parse failed");
        output
            .status
            .success()
            .then(|| String::from_utf8(output.stdout).unwrap().trim().to_string())
    }

    /// Content of `path` at `rev` on the remote.
    pub fn show(&self, rev: &str, path: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["show", &format!("{rev}:{path}")])
            .current_dir(self.bare())
            .output()
            .expect("git show failed");
        output
            .status
            .success()
            .then(|| String::from_utf8(output.stdout).unwrap())
    }

    /// Full message of the commit at `rev`.
    pub fn message(&self, rev: &str) -> String {
        let output = Command::new("git")
            .args(["log", "-1", "--format=%B", rev])
            .current_dir(self.bare())
            .output()
            .expect("git log failed");
        String::from_utf8(output.stdout).unwrap().trim_end().to_string()
    }

    /// Author `name <email>` of the commit at `rev`.
    pub fn author(&self, rev: &str) -> String {
        let output = Command::new("git")
            .args(["log", "-1", "--format=%an <%ae>", rev])
            .current_dir(self.bare())
            .output()
            .expect("git log failed");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    /// Store configuration targeting this remote's `main`.
    pub fn store_config(&self) -> GitStoreConfig {
        GitStoreConfig {
            auth: Credentials::new("gitimpartbot", "test-token"),
            token_env: "GITHUB_TOKEN".to_string(),
            base_branch: BranchName::new("main").unwrap(),
            new_branch: None,
            repository_url: self.url(),
            author_name: "gitimpartbot".to_string(),
            author_email: "gitimpartbot@users.noreply.github.com".to_string(),
            work_dir: None,
            subdir: None,
            push: true,
        }
    }
}

/// Run a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}
