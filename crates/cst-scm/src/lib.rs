//! Commit status adapters for source-hosting services
//!
//! This crate provides pluggable adapters for publishing a commit status
//! ("pending", "success", ...) against a repository ref. The core abstraction
//! is the `StatusNotifier` trait, with built-in implementations for the
//! GitHub REST API and a "none" fallback that only logs.

pub mod adapter;
pub mod config;
pub mod github;
pub mod none;

pub use adapter::{NotifierFactory, ScmError, StatusInput, StatusNotifier, StatusRecord, StatusState};
pub use config::ScmConfig;
pub use github::GitHubNotifier;
pub use none::NoneNotifier;
