// error.rs — Error types for run reconciliation.
//
// Only ReconcileError crosses the reconciler boundary. The others are
// reported through `Reconciled` and logged, since a run that can't be
// resolved or has no credentials isn't worth requeueing.

use thiserror::Error;

/// Why a run's commit could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("failed to find a git resource")]
    NoGitResource,

    #[error("found multiple git resources")]
    MultipleGitResources,

    #[error("failed to find param {0} on git resource")]
    MissingParam(String),

    #[error("failed to parse repo URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not determine repo from URL: {0}")]
    UnresolvableRepo(String),
}

/// Errors from a run store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse run at {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid run reference: {0}")]
    InvalidRunRef(String),
}

/// Errors loading the status API token for a namespace.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("error getting secret '{name}' in namespace '{namespace}': not found")]
    NotFound { name: String, namespace: String },

    #[error("secret {name} in namespace '{namespace}' does not have a '{key}' key")]
    MissingKey {
        name: String,
        namespace: String,
        key: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse secret at {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Errors surfaced to the caller so the whole reconciliation can be retried.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to load run: {0}")]
    Load(#[from] StoreError),

    #[error("failed to create commit status: {0}")]
    Dispatch(#[from] cst_scm::ScmError),
}
