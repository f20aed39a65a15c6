//! "None" adapter - logs the status instead of publishing it

use crate::adapter::{Result, StatusInput, StatusNotifier, StatusRecord};

/// Notifier that performs no API calls
///
/// Selected by `--dry-run`: every status is logged and echoed back as if
/// the service had accepted it.
pub struct NoneNotifier;

impl NoneNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusNotifier for NoneNotifier {
    fn create_status(
        &self,
        repo: &str,
        git_ref: &str,
        input: &StatusInput,
    ) -> Result<StatusRecord> {
        tracing::info!(
            repo,
            git_ref,
            state = %input.state,
            context = %input.label,
            "NoneNotifier: create_status() - no-op"
        );
        Ok(StatusRecord {
            id: 0,
            state: input.state,
            label: input.label.clone(),
            description: input.description.clone(),
            target_url: input.target_url.clone(),
            created_at: None,
        })
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StatusState;

    #[test]
    fn test_none_notifier_name() {
        assert_eq!(NoneNotifier::new().name(), "none");
    }

    #[test]
    fn test_none_notifier_echoes_input() {
        let input = StatusInput {
            state: StatusState::Failure,
            label: "ci".to_string(),
            description: "broken".to_string(),
            target_url: String::new(),
        };
        let record = NoneNotifier::new()
            .create_status("org/repo", "main", &input)
            .unwrap();
        assert_eq!(record.state, StatusState::Failure);
        assert_eq!(record.label, "ci");
        assert_eq!(record.description, "broken");
        assert_eq!(record.id, 0);
    }
}
