// watch.rs — Polling loop over the run store.
//
// Each tick lists every run and reconciles it on the blocking pool. At most
// `max_concurrent` slots are filled; a new run starts only when a running
// one finishes. Surfaced errors are logged; the next tick is the retry.

use std::sync::Arc;
use std::time::Duration;

use cst_tracker::{ReconcileError, Reconciled, Reconciler, RunRef, WatchConfig};
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;

/// Counts from one scan of the store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub runs: usize,
    pub notified: usize,
    pub failed: usize,
}

pub async fn execute(reconciler: Arc<Reconciler>, watch: &WatchConfig) -> anyhow::Result<()> {
    let interval = Duration::from_secs(watch.interval_secs.max(1));
    let max_concurrent = watch.max_concurrent.max(1);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(
        interval_secs = interval.as_secs(),
        max_concurrent,
        "watching for runs"
    );
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "failed to listen for shutdown signal");
                }
                tracing::info!("shutting down");
                break;
            }
            _ = ticker.tick() => {
                let summary = scan(&reconciler, max_concurrent).await;
                tracing::debug!(
                    runs = summary.runs,
                    notified = summary.notified,
                    failed = summary.failed,
                    "scan complete"
                );
            }
        }
    }
    Ok(())
}

type Finished = Result<(RunRef, Result<Reconciled, ReconcileError>), JoinError>;

/// Reconcile every run currently in the store, `max_concurrent` at a time.
pub async fn scan(reconciler: &Arc<Reconciler>, max_concurrent: usize) -> ScanSummary {
    let mut summary = ScanSummary::default();

    let lister = Arc::clone(reconciler);
    let refs = match tokio::task::spawn_blocking(move || lister.run_store().list()).await {
        Ok(Ok(refs)) => refs,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to list runs");
            return summary;
        }
        Err(e) => {
            tracing::error!(error = %e, "run listing task failed");
            return summary;
        }
    };
    summary.runs = refs.len();

    let mut tasks = JoinSet::new();
    for run_ref in refs {
        if tasks.len() >= max_concurrent.max(1) {
            if let Some(finished) = tasks.join_next().await {
                summary.record(finished);
            }
        }
        let reconciler = Arc::clone(reconciler);
        tasks.spawn_blocking(move || {
            let result = reconciler.reconcile(&run_ref);
            (run_ref, result)
        });
    }
    while let Some(finished) = tasks.join_next().await {
        summary.record(finished);
    }
    summary
}

impl ScanSummary {
    fn record(&mut self, finished: Finished) {
        match finished {
            Ok((_, Ok(Reconciled::Notified { .. }))) => self.notified += 1,
            Ok((run_ref, Ok(reconciled))) => {
                tracing::trace!(run = %run_ref, result = reconciled.label(), "reconciled");
            }
            Ok((run_ref, Err(e))) => {
                self.failed += 1;
                tracing::warn!(run = %run_ref, error = %e, "reconcile failed, retrying next tick");
            }
            Err(e) => {
                self.failed += 1;
                tracing::error!(error = %e, "reconcile task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_reconciler;
    use cst_tracker::run::{
        AnyRun, Condition, ConditionStatus, ObjectMeta, PipelineResourceSpec, PipelineRun,
        PipelineRunSpec, ResourceBinding, ResourceParam, ResourceType, RunStatus,
    };
    use cst_tracker::{FileRunStore, TrackerConfig};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn notifiable_run(name: &str, repo_url: &str) -> AnyRun {
        AnyRun::Pipeline(PipelineRun {
            metadata: ObjectMeta {
                name: name.to_string(),
                namespace: "ci".to_string(),
                annotations: HashMap::from([(
                    "tekton.dev/git-status".to_string(),
                    "true".to_string(),
                )]),
            },
            spec: PipelineRunSpec {
                resources: vec![ResourceBinding {
                    name: "source".to_string(),
                    resource_spec: Some(PipelineResourceSpec {
                        resource_type: ResourceType::Git,
                        params: vec![
                            ResourceParam {
                                name: "url".to_string(),
                                value: repo_url.to_string(),
                            },
                            ResourceParam {
                                name: "revision".to_string(),
                                value: "main".to_string(),
                            },
                        ],
                    }),
                    resource_ref: None,
                }],
            },
            status: RunStatus {
                conditions: vec![Condition {
                    condition_type: "Succeeded".to_string(),
                    status: ConditionStatus::True,
                    reason: None,
                    message: None,
                }],
            },
        })
    }

    fn write_token(dir: &std::path::Path) {
        let ns_dir = dir.join("ci");
        std::fs::create_dir_all(&ns_dir).unwrap();
        std::fs::write(
            ns_dir.join("commit-status-tracker-git-secret.json"),
            r#"{"data": {"token": "abc123"}}"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn scan_notifies_each_commit_once() {
        let dir = tempdir().unwrap();
        let mut config = TrackerConfig::default();
        config.store.runs_dir = dir.path().join("runs");
        config.store.secrets_dir = dir.path().join("secrets");
        write_token(&config.store.secrets_dir);

        let store = FileRunStore::new(&config.store.runs_dir);
        store
            .save(&notifiable_run("a", "https://github.com/org/one"))
            .unwrap();
        store
            .save(&notifiable_run("b", "https://github.com/org/two"))
            .unwrap();

        let reconciler = Arc::new(build_reconciler(&config, true));

        let first = scan(&reconciler, 2).await;
        assert_eq!(
            first,
            ScanSummary {
                runs: 2,
                notified: 2,
                failed: 0
            }
        );

        let second = scan(&reconciler, 2).await;
        assert_eq!(second.runs, 2);
        assert_eq!(second.notified, 0);
        assert_eq!(reconciler.tracker().len(), 2);
    }

    #[tokio::test]
    async fn single_slot_scan_still_covers_every_run() {
        let dir = tempdir().unwrap();
        let mut config = TrackerConfig::default();
        config.store.runs_dir = dir.path().join("runs");
        config.store.secrets_dir = dir.path().join("secrets");
        write_token(&config.store.secrets_dir);

        let store = FileRunStore::new(&config.store.runs_dir);
        for (name, repo) in [("a", "one"), ("b", "two"), ("c", "three")] {
            store
                .save(&notifiable_run(name, &format!("https://github.com/org/{}", repo)))
                .unwrap();
        }

        let reconciler = Arc::new(build_reconciler(&config, true));
        let summary = scan(&reconciler, 1).await;
        assert_eq!(summary.runs, 3);
        assert_eq!(summary.notified, 3);
    }

    #[tokio::test]
    async fn scan_of_empty_store_is_empty() {
        let dir = tempdir().unwrap();
        let mut config = TrackerConfig::default();
        config.store.runs_dir = dir.path().join("missing");

        let reconciler = Arc::new(build_reconciler(&config, true));
        let summary = scan(&reconciler, 1).await;
        assert_eq!(summary, ScanSummary::default());
    }
}
