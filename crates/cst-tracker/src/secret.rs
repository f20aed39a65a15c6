// secret.rs — Loading the status API token for a run's namespace.
//
// Every namespace that wants statuses published provides one well-known
// secret holding a bearer token. On disk the secret lives at
// `<secrets_dir>/<namespace>/<secret_name>.json` with the same shape as a
// cluster secret:
//
//   { "data": { "token": "ghp_..." } }

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SecretError;

/// Default name of the per-namespace secret.
pub const SECRET_NAME: &str = "commit-status-tracker-git-secret";

/// Default key of the token within the secret.
pub const SECRET_KEY: &str = "token";

/// Source of per-namespace bearer tokens.
pub trait SecretStore: Send + Sync {
    fn load_token(&self, namespace: &str) -> Result<String, SecretError>;
}

#[derive(Deserialize)]
struct SecretFile {
    #[serde(default)]
    data: HashMap<String, String>,
}

/// Surrounding whitespace is dropped; a blank token is no token.
fn usable_token(raw: Option<&String>) -> Option<String> {
    raw.map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Secrets read from JSON files.
pub struct FileSecretStore {
    secrets_dir: PathBuf,
    secret_name: String,
    secret_key: String,
}

impl FileSecretStore {
    pub fn new(secrets_dir: impl AsRef<Path>) -> Self {
        Self {
            secrets_dir: secrets_dir.as_ref().to_path_buf(),
            secret_name: SECRET_NAME.to_string(),
            secret_key: SECRET_KEY.to_string(),
        }
    }

    /// Override the secret name and token key.
    pub fn with_names(mut self, secret_name: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.secret_name = secret_name.into();
        self.secret_key = secret_key.into();
        self
    }

    fn secret_file(&self, namespace: &str) -> PathBuf {
        self.secrets_dir
            .join(namespace)
            .join(format!("{}.json", self.secret_name))
    }
}

impl SecretStore for FileSecretStore {
    fn load_token(&self, namespace: &str) -> Result<String, SecretError> {
        let path = self.secret_file(namespace);
        if !path.exists() {
            return Err(SecretError::NotFound {
                name: self.secret_name.clone(),
                namespace: namespace.to_string(),
            });
        }
        let json = fs::read_to_string(&path).map_err(|source| SecretError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let secret: SecretFile =
            serde_json::from_str(&json).map_err(|source| SecretError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        usable_token(secret.data.get(&self.secret_key)).ok_or_else(|| SecretError::MissingKey {
            name: self.secret_name.clone(),
            namespace: namespace.to_string(),
            key: self.secret_key.clone(),
        })
    }
}

/// Tokens held in memory, keyed by namespace.
#[derive(Default)]
pub struct MemorySecretStore {
    tokens: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, namespace: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(namespace.into(), token.into());
        self
    }
}

impl SecretStore for MemorySecretStore {
    fn load_token(&self, namespace: &str) -> Result<String, SecretError> {
        let raw = self
            .tokens
            .get(namespace)
            .ok_or_else(|| SecretError::NotFound {
                name: SECRET_NAME.to_string(),
                namespace: namespace.to_string(),
            })?;
        usable_token(Some(raw)).ok_or_else(|| SecretError::MissingKey {
            name: SECRET_NAME.to_string(),
            namespace: namespace.to_string(),
            key: SECRET_KEY.to_string(),
        })
    }
}
