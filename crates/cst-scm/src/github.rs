//! GitHub adapter: commit statuses through the REST API

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::adapter::{Result, ScmError, StatusInput, StatusNotifier, StatusRecord, StatusState};
use crate::config::ScmConfig;

const GITHUB_API_VERSION: &str = "2022-11-28";
const ERROR_BODY_MAX_CHARS: usize = 512;

/// GitHub commit status client
///
/// Posts to `/repos/{owner}/{repo}/statuses/{sha}` with a bearer token.
pub struct GitHubNotifier {
    http: Client,
    api_base: Url,
}

#[derive(Serialize)]
struct CreateStatusBody<'a> {
    state: &'static str,
    context: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<&'a str>,
}

#[derive(Deserialize)]
struct GitHubStatus {
    #[serde(default)]
    id: u64,
    state: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    target_url: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl GitHubNotifier {
    /// Build a client authenticated with `token`.
    pub fn new(token: &str, config: &ScmConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| ScmError::InvalidApiBase(format!("{}: {}", config.api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(ScmError::InvalidApiBase(config.api_base.clone()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ScmError::InvalidToken(format!("invalid user agent: {}", e)))?,
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| ScmError::InvalidToken("token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { http, api_base })
    }

    /// `{api_base}/repos/{org}/{repo}/statuses/{ref}`, each part encoded
    /// as a single path segment.
    fn statuses_url(&self, repo: &str, git_ref: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ScmError::InvalidApiBase(self.api_base.to_string()))?
            .pop_if_empty()
            .push("repos")
            .extend(repo.split('/'))
            .push("statuses")
            .push(git_ref);
        Ok(url)
    }
}

/// GitHub has no "unknown" state; `error` is the closest match.
fn wire_state(state: StatusState) -> &'static str {
    match state {
        StatusState::Pending => "pending",
        StatusState::Success => "success",
        StatusState::Failure => "failure",
        StatusState::Unknown => "error",
    }
}

fn parse_wire_state(state: &str) -> StatusState {
    match state {
        "pending" => StatusState::Pending,
        "success" => StatusState::Success,
        "failure" => StatusState::Failure,
        _ => StatusState::Unknown,
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_MAX_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(ERROR_BODY_MAX_CHARS).collect();
    out.push_str("...");
    out
}

impl StatusNotifier for GitHubNotifier {
    fn create_status(
        &self,
        repo: &str,
        git_ref: &str,
        input: &StatusInput,
    ) -> Result<StatusRecord> {
        let body = CreateStatusBody {
            state: wire_state(input.state),
            context: &input.label,
            description: &input.description,
            target_url: Some(input.target_url.as_str()).filter(|u| !u.is_empty()),
        };

        tracing::debug!(repo, git_ref, state = body.state, "GitHubNotifier: creating status");

        let response = self
            .http
            .post(self.statuses_url(repo, git_ref)?)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ScmError::Api {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        let created: GitHubStatus = response
            .json()
            .map_err(|e| ScmError::Decode(e.to_string()))?;

        Ok(StatusRecord {
            id: created.id,
            state: parse_wire_state(&created.state),
            label: created.context.unwrap_or_default(),
            description: created.description.unwrap_or_default(),
            target_url: created.target_url.unwrap_or_default(),
            created_at: created.created_at,
        })
    }

    fn name(&self) -> &str {
        "github"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config_for(server: &MockServer) -> ScmConfig {
        ScmConfig {
            api_base: server.base_url(),
            request_timeout_secs: 5,
            ..ScmConfig::default()
        }
    }

    fn input(state: StatusState, target_url: &str) -> StatusInput {
        StatusInput {
            state,
            label: "test-context".to_string(),
            description: "testing".to_string(),
            target_url: target_url.to_string(),
        }
    }

    #[test]
    fn create_status_posts_to_statuses_endpoint() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/tektoncd/triggers/statuses/master")
                .header("authorization", "Bearer secret-token")
                .json_body(json!({
                    "state": "success",
                    "context": "test-context",
                    "description": "testing"
                }));
            then.status(201).json_body(json!({
                "id": 42,
                "state": "success",
                "context": "test-context",
                "description": "testing",
                "target_url": null,
                "created_at": "2020-01-02T03:04:05Z"
            }));
        });

        let notifier = GitHubNotifier::new("secret-token", &config_for(&server)).unwrap();
        let record = notifier
            .create_status("tektoncd/triggers", "master", &input(StatusState::Success, ""))
            .unwrap();

        create.assert();
        assert_eq!(record.id, 42);
        assert_eq!(record.state, StatusState::Success);
        assert_eq!(record.label, "test-context");
        assert_eq!(record.target_url, "");
        assert!(record.created_at.is_some());
    }

    #[test]
    fn target_url_is_sent_when_present() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/org/repo/statuses/abc123")
                .json_body(json!({
                    "state": "pending",
                    "context": "test-context",
                    "description": "testing",
                    "target_url": "https://ci.example.com/runs/1"
                }));
            then.status(201).json_body(json!({
                "id": 7,
                "state": "pending",
                "target_url": "https://ci.example.com/runs/1"
            }));
        });

        let notifier = GitHubNotifier::new("t", &config_for(&server)).unwrap();
        let record = notifier
            .create_status(
                "org/repo",
                "abc123",
                &input(StatusState::Pending, "https://ci.example.com/runs/1"),
            )
            .unwrap();

        create.assert();
        assert_eq!(record.target_url, "https://ci.example.com/runs/1");
        assert_eq!(record.label, "");
    }

    #[test]
    fn unknown_state_is_sent_as_error() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/org/repo/statuses/main")
                .body_includes("\"state\":\"error\"");
            then.status(201).json_body(json!({ "id": 1, "state": "error" }));
        });

        let notifier = GitHubNotifier::new("t", &config_for(&server)).unwrap();
        let record = notifier
            .create_status("org/repo", "main", &input(StatusState::Unknown, ""))
            .unwrap();

        create.assert();
        assert_eq!(record.state, StatusState::Unknown);
    }

    #[test]
    fn non_success_response_is_an_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/repos/org/repo/statuses/main");
            then.status(422).body("{\"message\":\"No commit found for SHA: main\"}");
        });

        let notifier = GitHubNotifier::new("t", &config_for(&server)).unwrap();
        let err = notifier
            .create_status("org/repo", "main", &input(StatusState::Failure, ""))
            .unwrap_err();

        match err {
            ScmError::Api { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("No commit found"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let result = GitHubNotifier::new("bad\ntoken\nvalue", &ScmConfig::default());
        assert!(matches!(result, Err(ScmError::InvalidToken(_))));
    }

    #[test]
    fn ref_is_encoded_as_one_path_segment() {
        let notifier = GitHubNotifier::new("t", &ScmConfig::default()).unwrap();
        let url = notifier.statuses_url("org/repo", "feature/a#b?c").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/org/repo/statuses/feature%2Fa%23b%3Fc"
        );
    }

    #[test]
    fn api_base_path_prefix_is_kept() {
        let config = ScmConfig {
            api_base: "https://github.example.com/api/v3/".to_string(),
            ..ScmConfig::default()
        };
        let notifier = GitHubNotifier::new("t", &config).unwrap();
        let url = notifier.statuses_url("org/repo", "main").unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.example.com/api/v3/repos/org/repo/statuses/main"
        );
    }

    #[test]
    fn unusable_api_base_is_rejected() {
        let config = ScmConfig {
            api_base: "not a url".to_string(),
            ..ScmConfig::default()
        };
        let result = GitHubNotifier::new("t", &config);
        assert!(matches!(result, Err(ScmError::InvalidApiBase(_))));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(ERROR_BODY_MAX_CHARS + 10);
        let out = truncate(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), ERROR_BODY_MAX_CHARS + 3);
    }
}
