//! # cst-tracker
//!
//! Mirrors the outcome of CI pipeline and task runs onto the commit they
//! built, as commit statuses on the source-hosting service.
//!
//! A run opts in through annotations. Each reconciliation pass loads the
//! run, works out the commit from its single git resource, derives a state
//! from the run's `Succeeded` condition and publishes a status, at most
//! once per commit and state.
//!
//! ## Key components
//!
//! - [`TrackedRun`] — shared view over [`PipelineRun`] and [`TaskRun`]
//! - [`RunStore`] / [`SecretStore`] — where runs and API tokens come from
//! - [`NotificationTracker`] — last notified state per commit
//! - [`Reconciler`] — one pass: load, resolve, dedup, dispatch, record

pub mod annotations;
pub mod config;
pub mod error;
pub mod hasher;
pub mod notified;
pub mod reconciler;
pub mod resource;
pub mod run;
pub mod run_state;
pub mod secret;
pub mod status_input;
pub mod store;

pub use config::{StoreConfig, TrackerConfig, WatchConfig};
pub use error::{ReconcileError, ResolveError, SecretError, StoreError};
pub use hasher::key_for_commit;
pub use notified::{Claim, NotificationTracker};
pub use reconciler::{ReconcileReport, Reconciled, Reconciler};
pub use resource::{extract_repo, find_commit, Commit};
pub use run::{AnyRun, PipelineRun, RunKind, RunRef, TaskRun, TrackedRun};
pub use run_state::{conditions_to_state, RunState};
pub use secret::{FileSecretStore, MemorySecretStore, SecretStore};
pub use status_input::{commit_status_input, convert_state};
pub use store::{FileRunStore, MemoryRunStore, RunStore};
