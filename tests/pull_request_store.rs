//! Integration tests for pull-request delivery.
//!
//! A local bare repository receives the change branch; `MockForge` stands
//! in for the GitHub API.

mod common;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use common::Remote;
use serde_json::json;

use gitimpart::core::types::BranchName;
use gitimpart::forge::mock::MockForge;
use gitimpart::forge::{CreatePrRequest, ForgeError};
use gitimpart::push::{deliver, PushOptions};
use gitimpart::render::ContentTree;
use gitimpart::store::{CommitOutcome, GitStore, PullRequestStore, StoreError};

const BRANCH: &str = "gitimpart/app-20240102030405";

fn app_tree() -> ContentTree {
    serde_json::from_value(json!({"$files": {"config/app.yaml": {"replicas": 2}}})).unwrap()
}

fn git_store(remote: &Remote, push: bool) -> GitStore {
    let mut config = remote.store_config();
    config.new_branch = Some(BranchName::new(BRANCH).unwrap());
    config.push = push;
    GitStore::new(config).unwrap()
}

fn options() -> PushOptions {
    PushOptions {
        subject: Some("Update app".into()),
        body: Some("Rendered from app.jsonnet".into()),
        ..Default::default()
    }
}

/// Shared in-memory sink for the dry-run preview.
#[derive(Clone, Default)]
struct Preview(Arc<Mutex<Vec<u8>>>);

impl Write for Preview {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn pull_request_is_opened_after_push() {
    let remote = Remote::new();
    let forge = MockForge::new();
    let mut store = PullRequestStore::new(git_store(&remote, true), Box::new(forge.clone()));

    let delivery = deliver(&app_tree(), &mut store, &options()).unwrap();

    assert_eq!(
        forge.requests(),
        vec![CreatePrRequest {
            head: BRANCH.to_string(),
            base: "main".to_string(),
            title: "Update app".to_string(),
            body: Some("Rendered from app.jsonnet".to_string()),
        }]
    );
    match delivery.outcome {
        CommitOutcome::Committed {
            branch,
            pushed,
            pull_request: Some(pr),
            ..
        } => {
            assert_eq!(branch.as_str(), BRANCH);
            assert!(pushed);
            assert_eq!(pr.number, 1);
            assert_eq!(pr.head, BRANCH);
        }
        other => panic!("unexpected outcome: {other}"),
    }
    assert!(remote.show(BRANCH, "config/app.yaml").is_some());
}

#[test]
fn default_title_is_the_change_branch() {
    let remote = Remote::new();
    let forge = MockForge::new();
    let mut store = PullRequestStore::new(git_store(&remote, true), Box::new(forge.clone()));

    deliver(&app_tree(), &mut store, &PushOptions::default()).unwrap();

    let requests = forge.requests();
    assert_eq!(requests[0].title, BRANCH);
    assert_eq!(requests[0].body, None);
}

#[test]
fn no_changes_opens_nothing() {
    let remote = Remote::new();
    let forge = MockForge::new();
    let mut store = PullRequestStore::new(git_store(&remote, true), Box::new(forge.clone()));

    let delivery = deliver(&ContentTree::default(), &mut store, &options()).unwrap();

    assert_eq!(delivery.outcome, CommitOutcome::NoChanges);
    assert!(forge.requests().is_empty());
    assert_eq!(remote.rev(BRANCH), None);
}

#[test]
fn dry_run_previews_instead_of_opening() {
    let remote = Remote::new();
    let forge = MockForge::new();
    let preview = Preview::default();
    let mut store = PullRequestStore::new(git_store(&remote, false), Box::new(forge.clone()))
        .dry_run(true)
        .preview_to(Box::new(preview.clone()));

    let delivery = deliver(&app_tree(), &mut store, &options()).unwrap();

    assert!(matches!(
        delivery.outcome,
        CommitOutcome::Committed {
            pushed: false,
            pull_request: None,
            ..
        }
    ));
    assert!(forge.requests().is_empty());
    assert_eq!(remote.rev(BRANCH), None);

    let text = String::from_utf8(preview.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains(&format!("{} -> main", BRANCH)), "{text}");
    assert!(text.contains("title: Update app"), "{text}");
    assert!(text.contains("Rendered from app.jsonnet"), "{text}");
}

#[test]
fn dry_run_without_changes_previews_nothing() {
    let remote = Remote::new();
    let forge = MockForge::new();
    let preview = Preview::default();
    let mut store = PullRequestStore::new(git_store(&remote, false), Box::new(forge.clone()))
        .dry_run(true)
        .preview_to(Box::new(preview.clone()));

    let delivery = deliver(&ContentTree::default(), &mut store, &options()).unwrap();

    assert_eq!(delivery.outcome, CommitOutcome::NoChanges);
    assert!(forge.requests().is_empty());
    assert!(preview.0.lock().unwrap().is_empty());
}

#[test]
fn forge_failure_keeps_pushed_branch() {
    let remote = Remote::new();
    let forge = MockForge::new().failing_with(ForgeError::ApiError {
        status: 422,
        message: "Validation Failed".into(),
    });
    let mut store = PullRequestStore::new(git_store(&remote, true), Box::new(forge.clone()));

    let err = deliver(&app_tree(), &mut store, &options()).unwrap_err();

    match err {
        StoreError::PullRequest { branch, source } => {
            assert_eq!(branch, BRANCH);
            assert!(matches!(source, ForgeError::ApiError { status: 422, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(forge.requests().len(), 1);
    assert!(remote.show(BRANCH, "config/app.yaml").is_some());
}
