//! Status API client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every notifier built from a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScmConfig {
    /// Base URL of the REST API (no trailing slash needed)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// Serde default functions
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "commit-status-tracker".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_clamped() {
        let config = ScmConfig {
            request_timeout_secs: 0,
            ..ScmConfig::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn defaults_point_at_github() {
        let config = ScmConfig::default();
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.request_timeout_secs, 30);
    }
}
