//! Core StatusNotifier trait and status types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while publishing a commit status
#[derive(Debug, Error)]
pub enum ScmError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid API base URL: {0}")]
    InvalidApiBase(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode status response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ScmError>;

/// State of a commit status as understood by this system.
///
/// `Unknown` has no direct counterpart on most hosting services; adapters
/// decide how to express it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Unknown,
    Pending,
    Failure,
    Success,
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusState::Unknown => write!(f, "unknown"),
            StatusState::Pending => write!(f, "pending"),
            StatusState::Failure => write!(f, "failure"),
            StatusState::Success => write!(f, "success"),
        }
    }
}

/// The status to publish against a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInput {
    pub state: StatusState,

    /// Context string that distinguishes this status from others on the
    /// same commit (e.g. "ci/tekton").
    pub label: String,

    pub description: String,

    /// Link shown next to the status. Empty means no link.
    pub target_url: String,
}

/// A status as recorded by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Service-assigned identifier (0 when the adapter has none).
    pub id: u64,

    pub state: StatusState,

    pub label: String,

    pub description: String,

    pub target_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Pluggable client for publishing commit statuses
///
/// One instance is built per credential, so implementations carry the
/// token they were constructed with.
pub trait StatusNotifier: Send + Sync {
    /// Create a status for `git_ref` in `repo` (an `org/repo` identifier).
    fn create_status(&self, repo: &str, git_ref: &str, input: &StatusInput)
        -> Result<StatusRecord>;

    /// Adapter display name (for logs)
    fn name(&self) -> &str;
}

/// Builds a notifier from a bearer token.
pub type NotifierFactory =
    Box<dyn Fn(&str) -> Result<Box<dyn StatusNotifier>> + Send + Sync>;
