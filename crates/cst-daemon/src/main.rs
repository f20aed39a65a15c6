//! # cst-daemon
//!
//! Commit status tracker daemon.
//!
//! Reads CI run manifests from the run store and mirrors each annotated
//! run's outcome onto its commit as a commit status:
//! - `cst-daemon reconcile <namespace>/<name>` — one pass for one run
//! - `cst-daemon watch` — poll the store and reconcile every run
//! - `cst-daemon key <repo> <ref>` — print the notification key for a commit
//!
//! Configuration comes from `tracker.toml` (see `TrackerConfig`); flags
//! given on the command line win over the file.

mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use cst_tracker::{key_for_commit, RunKind, RunRef, TrackerConfig};

const DEFAULT_CONFIG_FILE: &str = "tracker.toml";
const DEFAULT_LOG_DIRECTIVES: &str = "cst_tracker=info,cst_scm=info,cst_daemon=info";

/// Mirror CI run outcomes as commit statuses.
#[derive(Parser)]
#[command(name = "cst-daemon", version, about)]
struct Cli {
    /// Path to the tracker config file [default: tracker.toml, if present].
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of run manifests (overrides `[store] runs_dir`).
    #[arg(long)]
    runs_dir: Option<PathBuf>,

    /// Directory of namespace secrets (overrides `[store] secrets_dir`).
    #[arg(long)]
    secrets_dir: Option<PathBuf>,

    /// Status API base URL (overrides `[scm] api_base`).
    #[arg(long)]
    api_base: Option<String>,

    /// Log statuses instead of publishing them.
    #[arg(long)]
    dry_run: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a single run once.
    Reconcile {
        /// Run to reconcile, as `<namespace>/<name>`.
        run: String,
        /// The run is a TaskRun rather than a PipelineRun.
        #[arg(long)]
        task_run: bool,
    },
    /// Poll the run store and reconcile every run until interrupted.
    Watch,
    /// Print the notification key for a repo and ref.
    Key {
        /// Repository as `org/repo`.
        repo: String,
        /// Commit SHA or ref name.
        git_ref: String,
    },
}

fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    // RUST_LOG wins when set.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))?;

    // Logs go to stderr so stdout stays clean for command output.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<TrackerConfig> {
    // An explicit --config must load; the default file is optional.
    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {}", path.display(), e))?,
        None => TrackerConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
    };

    if let Some(dir) = &cli.runs_dir {
        config.store.runs_dir = dir.clone();
    }
    if let Some(dir) = &cli.secrets_dir {
        config.store.secrets_dir = dir.clone();
    }
    if let Some(api_base) = &cli.api_base {
        config.scm.api_base = api_base.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    match &cli.command {
        Commands::Key { repo, git_ref } => {
            println!("{}", key_for_commit(repo, git_ref));
            Ok(())
        }
        Commands::Reconcile { run, task_run } => {
            let config = load_config(&cli)?;
            let kind = if *task_run {
                RunKind::TaskRun
            } else {
                RunKind::PipelineRun
            };
            let run_ref = RunRef::parse(kind, run).context("invalid run identifier")?;
            let reconciler = Arc::new(commands::build_reconciler(&config, cli.dry_run));
            commands::reconcile::execute(reconciler, run_ref).await
        }
        Commands::Watch => {
            let config = load_config(&cli)?;
            tracing::info!(
                runs_dir = %config.store.runs_dir.display(),
                secrets_dir = %config.store.secrets_dir.display(),
                api_base = %config.scm.api_base,
                dry_run = cli.dry_run,
                "Starting commit status tracker"
            );
            let reconciler = Arc::new(commands::build_reconciler(&config, cli.dry_run));
            commands::watch::execute(reconciler, &config.watch).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn flags_override_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        std::fs::write(
            &path,
            "[store]\nruns_dir = \"/var/runs\"\nsecrets_dir = \"/var/secrets\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "cst-daemon",
            "--config",
            path.to_str().unwrap(),
            "--secrets-dir",
            "/tmp/secrets",
            "--api-base",
            "https://github.example.com/api/v3",
            "watch",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.store.runs_dir, PathBuf::from("/var/runs"));
        assert_eq!(config.store.secrets_dir, PathBuf::from("/tmp/secrets"));
        assert_eq!(config.scm.api_base, "https://github.example.com/api/v3");
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cli = Cli::try_parse_from([
            "cst-daemon",
            "--config",
            path.to_str().unwrap(),
            "watch",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn reconcile_subcommand_parses_run_and_kind() {
        let cli =
            Cli::try_parse_from(["cst-daemon", "reconcile", "ci/build-1", "--task-run"]).unwrap();
        match cli.command {
            Commands::Reconcile { run, task_run } => {
                assert_eq!(run, "ci/build-1");
                assert!(task_run);
            }
            _ => panic!("expected reconcile"),
        }
    }
}
