//! Tracker configuration structures

use std::path::{Path, PathBuf};

use cst_scm::ScmConfig;
use serde::{Deserialize, Serialize};

use crate::secret::{SECRET_KEY, SECRET_NAME};

/// Top-level configuration from tracker.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Name of the per-namespace secret holding the API token
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// Key of the token within that secret
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Status API client settings
    #[serde(default)]
    pub scm: ScmConfig,

    /// Where runs and secrets are read from
    #[serde(default)]
    pub store: StoreConfig,

    /// Polling loop settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            secret_name: default_secret_name(),
            secret_key: default_secret_key(),
            scm: ScmConfig::default(),
            store: StoreConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

/// Store locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root of `<namespace>/<kind>/<name>.json` run manifests
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,

    /// Root of `<namespace>/<secret>.json` secrets
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            runs_dir: default_runs_dir(),
            secrets_dir: default_secrets_dir(),
        }
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between store scans
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Reconciliations allowed to run at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

// Serde default functions
fn default_secret_name() -> String {
    SECRET_NAME.to_string()
}

fn default_secret_key() -> String {
    SECRET_KEY.to_string()
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("runs")
}

fn default_secrets_dir() -> PathBuf {
    PathBuf::from("secrets")
}

fn default_interval_secs() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    4
}

impl TrackerConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load config, returning default if the file doesn't exist
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }
}
