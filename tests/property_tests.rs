//! Property-based tests for the content model and naming rules.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use gitimpart::core::naming::{change_branch, slugify};
use gitimpart::core::remote::repo_url;
use gitimpart::core::types::BranchName;
use gitimpart::render::{Content, ContentTree};

/// Strategy for repository-relative path segments.
fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,8}"
}

/// Strategy for small file contents.
fn content() -> impl Strategy<Value = Content> {
    prop_oneof![
        "[a-z: \n]{0,20}".prop_map(Content::Text),
        any::<i64>().prop_map(|n| Content::Data(serde_json::json!({ "n": n }))),
    ]
}

/// Strategy for trees with both plain files and aggregation members.
fn content_tree() -> impl Strategy<Value = ContentTree> {
    let files = prop::collection::btree_map(
        (segment(), segment()).prop_map(|(d, f)| format!("{d}/{f}.yaml")),
        content(),
        0..5,
    );
    let members = prop::collection::btree_map(
        segment().prop_map(|f| format!("{f}.yaml")),
        content().prop_map(Some),
        1..4,
    );
    let kustomize = prop::collection::btree_map(segment(), members, 0..3);

    (files, kustomize).prop_map(|(files, kustomize)| ContentTree { files, kustomize })
}

proptest! {
    /// Expanding twice is the same as expanding once.
    #[test]
    fn expansion_is_idempotent(tree in content_tree()) {
        let mut once = tree.clone();
        once.expand_kustomize();
        let mut twice = once.clone();
        twice.expand_kustomize();
        prop_assert_eq!(once, twice);
    }

    /// Expansion leaves every member null and every member present in files.
    #[test]
    fn expansion_moves_every_member(tree in content_tree()) {
        let mut expanded = tree.clone();
        expanded.expand_kustomize();

        for (dir, members) in &tree.kustomize {
            for (name, content) in members {
                let path = format!("{dir}/{name}");
                prop_assert_eq!(expanded.files.get(&path), content.as_ref());
                prop_assert_eq!(&expanded.kustomize[dir][name], &None);
            }
        }
    }

    /// Aggregation directories and member names survive expansion.
    #[test]
    fn expansion_keeps_aggregations(tree in content_tree()) {
        let before: BTreeMap<String, Vec<String>> = tree
            .aggregations()
            .map(|(d, m)| (d.to_string(), m.into_iter().map(str::to_string).collect()))
            .collect();

        let mut expanded = tree.clone();
        expanded.expand_kustomize();
        let after: BTreeMap<String, Vec<String>> = expanded
            .aggregations()
            .map(|(d, m)| (d.to_string(), m.into_iter().map(str::to_string).collect()))
            .collect();

        prop_assert_eq!(before, after);
    }

    /// The wire format round-trips an expanded tree.
    #[test]
    fn expanded_tree_survives_json(tree in content_tree()) {
        let mut expanded = tree;
        expanded.expand_kustomize();
        let json = serde_json::to_vec(&expanded).unwrap();
        prop_assert_eq!(ContentTree::from_json(&json).unwrap(), expanded);
    }

    /// Slugs only contain lowercase alphanumerics and single hyphens.
    #[test]
    fn slug_is_branch_safe(id in ".{0,80}") {
        let slug = slugify(&id);
        prop_assert!(slug.len() <= 50);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.contains("--"));
        prop_assert!(!slug.starts_with('-'));
    }

    /// Any id with a usable character yields a valid change branch.
    #[test]
    fn change_branch_is_valid(id in "[A-Za-z0-9][A-Za-z0-9 _.-]{0,40}", secs in 0i64..4_000_000_000) {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        let branch = change_branch(&id, at).unwrap();
        prop_assert!(branch.as_str().starts_with("gitimpart/"));
        prop_assert!(BranchName::new(branch.as_str()).is_ok());
    }

    /// URL normalization never panics.
    #[test]
    fn repo_url_never_panics(repo in ".{0,60}") {
        let _ = repo_url(&repo, "https://github.com/");
    }
}
