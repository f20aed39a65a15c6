// reconcile.rs — One-shot reconciliation of a single run.

use std::sync::Arc;

use anyhow::Context;
use cst_tracker::{ReconcileReport, Reconciler, RunRef};

pub async fn execute(reconciler: Arc<Reconciler>, run_ref: RunRef) -> anyhow::Result<()> {
    let target = run_ref.clone();
    let reconciled = tokio::task::spawn_blocking(move || reconciler.reconcile(&target))
        .await
        .context("reconcile task panicked")?
        .with_context(|| format!("failed to reconcile {}", run_ref))?;

    let report = ReconcileReport::new(&run_ref, &reconciled);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
