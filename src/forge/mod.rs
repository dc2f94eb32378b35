//! forge
//!
//! Abstraction for the pull-request API of a remote forge.
//!
//! # Architecture
//!
//! The `Forge` trait is the seam between the pull-request store and the
//! hosting service. Only the GitHub REST API is implemented; tests use the
//! in-memory [`mock`].
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: Mock implementation for deterministic testing

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
