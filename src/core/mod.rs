//! core
//!
//! Core domain types and configuration for gitimpart.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName
//! - [`config`] - Environment settings and delivery target schema
//! - [`remote`] - Repository URL normalization
//! - [`naming`] - Change branch naming
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid branch names from reaching git
//! - Configuration is assembled once and passed down explicitly

pub mod config;
pub mod naming;
pub mod remote;
pub mod types;
