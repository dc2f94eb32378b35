//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! Stores created PRs in memory, records every request, and can be told to
//! fail.
//!
//! # Example
//!
//! ```
//! use gitimpart::forge::mock::MockForge;
//! use gitimpart::forge::{CreatePrRequest, Forge};
//!
//! let forge = MockForge::new();
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let pr = runtime
//!     .block_on(forge.create_pr(CreatePrRequest {
//!         head: "feature".to_string(),
//!         base: "main".to_string(),
//!         title: "Add feature".to_string(),
//!         body: None,
//!     }))
//!     .unwrap();
//!
//! assert_eq!(pr.number, 1);
//! assert_eq!(forge.requests().len(), 1);
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::traits::{CreatePrRequest, Forge, ForgeError, PullRequest};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
}

#[derive(Debug, Default)]
struct MockForgeInner {
    /// Created PRs in creation order.
    prs: Vec<PullRequest>,
    /// Error to return from create_pr.
    fail_with: Option<ForgeError>,
    /// Every request received, including failed ones.
    requests: Vec<CreatePrRequest>,
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every create_pr call fail with `err`.
    pub fn failing_with(self, err: ForgeError) -> Self {
        self.inner.lock().unwrap().fail_with = Some(err);
        self
    }

    /// Every create_pr request received.
    pub fn requests(&self) -> Vec<CreatePrRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// PRs created so far.
    pub fn prs(&self) -> Vec<PullRequest> {
        self.inner.lock().unwrap().prs.clone()
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request.clone());

        if let Some(err) = inner.fail_with.clone() {
            return Err(err);
        }

        let number = inner.prs.len() as u64 + 1;
        let pr = PullRequest {
            number,
            url: format!("https://github.com/mock/mock/pull/{}", number),
            head: request.head,
            base: request.base,
        };
        inner.prs.push(pr.clone());
        Ok(pr)
    }
}
