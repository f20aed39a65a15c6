// reconciler.rs — One reconciliation pass for a run.
//
// The pass walks a fixed sequence and stops at the first terminal step:
//
//   load run → notifiable? → resolve commit → derive state → claim key
//     → load token → build status → dispatch → record
//
// Only a failed load (other than not-found) or a failed dispatch is
// returned as an error; the caller retries the whole pass. Everything else
// ends the pass quietly and is reported through `Reconciled`.
//
// A failed dispatch drops the tracker claim, so the next pass for the same
// state tries again instead of being suppressed.

use cst_scm::{NotifierFactory, StatusRecord, StatusState};
use serde::Serialize;

use crate::error::{ReconcileError, ResolveError, SecretError};
use crate::hasher::key_for_commit;
use crate::notified::NotificationTracker;
use crate::run::{RunRef, TrackedRun};
use crate::secret::SecretStore;
use crate::status_input::commit_status_input;
use crate::store::RunStore;

/// How a reconciliation pass ended without error.
#[derive(Debug)]
pub enum Reconciled {
    /// The run no longer exists.
    RunNotFound,

    /// The run isn't annotated for status reporting.
    NotNotifiable,

    /// The run's commit couldn't be determined.
    Unresolvable(ResolveError),

    /// This state was already notified for the commit.
    Suppressed {
        repo: String,
        git_ref: String,
        state: StatusState,
    },

    /// No usable token for the run's namespace.
    NoCredentials(SecretError),

    /// A status was published.
    Notified {
        repo: String,
        git_ref: String,
        state: StatusState,
        record: StatusRecord,
    },
}

impl Reconciled {
    /// Short name of the terminal step, for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Reconciled::RunNotFound => "run_not_found",
            Reconciled::NotNotifiable => "not_notifiable",
            Reconciled::Unresolvable(_) => "unresolvable",
            Reconciled::Suppressed { .. } => "suppressed",
            Reconciled::NoCredentials(_) => "no_credentials",
            Reconciled::Notified { .. } => "notified",
        }
    }
}

/// Summary row for reporting a pass.
#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub run: String,
    pub result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReconcileReport {
    pub fn new(run_ref: &RunRef, reconciled: &Reconciled) -> Self {
        let detail = match reconciled {
            Reconciled::RunNotFound | Reconciled::NotNotifiable => None,
            Reconciled::Unresolvable(e) => Some(e.to_string()),
            Reconciled::NoCredentials(e) => Some(e.to_string()),
            Reconciled::Suppressed {
                repo,
                git_ref,
                state,
            } => Some(format!("{} already {} at {}", repo, state, git_ref)),
            Reconciled::Notified {
                repo,
                git_ref,
                state,
                ..
            } => Some(format!("{} {} at {}", repo, state, git_ref)),
        };
        Self {
            run: run_ref.to_string(),
            result: reconciled.label(),
            detail,
        }
    }
}

/// Mirrors run outcomes as commit statuses.
///
/// Shareable across threads; the tracker is the only mutable state.
pub struct Reconciler {
    runs: Box<dyn RunStore>,
    secrets: Box<dyn SecretStore>,
    notifier_factory: NotifierFactory,
    tracker: NotificationTracker,
}

impl Reconciler {
    pub fn new(
        runs: Box<dyn RunStore>,
        secrets: Box<dyn SecretStore>,
        notifier_factory: NotifierFactory,
    ) -> Self {
        Self {
            runs,
            secrets,
            notifier_factory,
            tracker: NotificationTracker::new(),
        }
    }

    pub fn tracker(&self) -> &NotificationTracker {
        &self.tracker
    }

    pub fn run_store(&self) -> &dyn RunStore {
        self.runs.as_ref()
    }

    /// Run one reconciliation pass for `run_ref`.
    pub fn reconcile(&self, run_ref: &RunRef) -> Result<Reconciled, ReconcileError> {
        let span = tracing::info_span!(
            "reconcile",
            kind = %run_ref.kind,
            namespace = %run_ref.namespace,
            name = %run_ref.name
        );
        let _enter = span.enter();
        tracing::debug!("reconciling run");

        let Some(run) = self.runs.load(run_ref)? else {
            tracing::debug!("run not found, nothing to do");
            return Ok(Reconciled::RunNotFound);
        };

        if !run.is_notifiable() {
            tracing::debug!("not a notifiable run");
            return Ok(Reconciled::NotNotifiable);
        }

        let commit = match run.find_commit() {
            Ok(commit) => commit,
            Err(e) => {
                tracing::error!(error = %e, "failed to find a git resource");
                return Ok(Reconciled::Unresolvable(e));
            }
        };
        let repo = match commit.repo() {
            Ok(repo) => repo,
            Err(e) => {
                tracing::error!(error = %e, url = %commit.repo_url, "could not parse git repository into a repo");
                return Ok(Reconciled::Unresolvable(e));
            }
        };
        let git_ref = commit.git_ref;
        tracing::debug!(repo = %repo, git_ref = %git_ref, "found a git resource");

        let run_state = run.run_state();
        let key = key_for_commit(&repo, &git_ref);
        let input = commit_status_input(run.annotations(), run_state);

        let Some(claim) = self.tracker.claim(&key, run_state) else {
            tracing::debug!(repo = %repo, git_ref = %git_ref, state = %run_state, "state already notified");
            return Ok(Reconciled::Suppressed {
                repo,
                git_ref,
                state: input.state,
            });
        };

        let token = match self.secrets.load_token(&run_ref.namespace) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "failed to get an auth secret");
                return Ok(Reconciled::NoCredentials(e));
            }
        };

        let notifier = (self.notifier_factory)(&token)?;
        tracing::info!(
            notifier = notifier.name(),
            repo = %repo,
            git_ref = %git_ref,
            state = %input.state,
            context = %input.label,
            "creating a commit status"
        );
        let record = notifier.create_status(&repo, &git_ref, &input)?;
        claim.commit();

        tracing::info!(id = record.id, state = %record.state, "created a commit status");
        Ok(Reconciled::Notified {
            repo,
            git_ref,
            state: input.state,
            record,
        })
    }
}
