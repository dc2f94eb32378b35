//! gitimpart - Render configuration templates and deliver them to Git repositories
//!
//! A run turns one template or data file into a flat tree of target files,
//! registers aggregated files with kustomize, then delivers the tree: to a
//! local directory, as a commit pushed to a branch, or as a pull request.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, calls the library)
//! - [`push`] - Write phase and the render-to-store pipeline
//! - [`render`] - Content model and template evaluation
//! - [`store`] - Transactional stores: local, git, pull request
//! - [`kustomize`] - Aggregation manifests through the kustomize tool
//! - [`core`] - Domain types, settings, naming and repository URLs
//! - [`git`] - Single interface for all Git operations
//! - [`forge`] - Pull-request API abstraction (GitHub)
//! - [`ui`] - User-facing output
//!
//! # Guarantees
//!
//! 1. Nothing is committed unless the write phase succeeded
//! 2. A run that changes nothing creates no commit, push or pull request
//! 3. A change branch with history the base lacks is never overwritten
//! 4. Temporary clones are removed when the store is dropped

pub mod cli;
pub mod core;
pub mod forge;
pub mod git;
pub mod kustomize;
pub mod push;
pub mod render;
pub mod store;
pub mod ui;
