// status_input.rs — Building the commit status from a run's annotations.

use std::collections::HashMap;

use cst_scm::{StatusInput, StatusState};

use crate::annotations::{annotation_or, STATUS_CONTEXT, STATUS_DESCRIPTION, STATUS_TARGET_URL};
use crate::run_state::RunState;

/// Build the status to publish for a run in `state`.
pub fn commit_status_input(annotations: &HashMap<String, String>, state: RunState) -> StatusInput {
    StatusInput {
        state: convert_state(state),
        label: annotation_or(annotations, STATUS_CONTEXT, "default").to_string(),
        description: annotation_or(annotations, STATUS_DESCRIPTION, "").to_string(),
        target_url: annotation_or(annotations, STATUS_TARGET_URL, "").to_string(),
    }
}

pub fn convert_state(state: RunState) -> StatusState {
    match state {
        RunState::Failed => StatusState::Failure,
        RunState::Pending => StatusState::Pending,
        RunState::Successful => StatusState::Success,
        RunState::Error => StatusState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_annotations() {
        let input = commit_status_input(&HashMap::new(), RunState::Pending);
        assert_eq!(
            input,
            StatusInput {
                state: StatusState::Pending,
                label: "default".to_string(),
                description: String::new(),
                target_url: String::new(),
            }
        );
    }

    #[test]
    fn annotations_override_defaults() {
        let annotations: HashMap<String, String> = [
            (STATUS_CONTEXT, "test-context"),
            (STATUS_DESCRIPTION, "testing"),
            (STATUS_TARGET_URL, "https://ci.example.com/runs/1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let input = commit_status_input(&annotations, RunState::Failed);
        assert_eq!(input.state, StatusState::Failure);
        assert_eq!(input.label, "test-context");
        assert_eq!(input.description, "testing");
        assert_eq!(input.target_url, "https://ci.example.com/runs/1");
    }

    #[test]
    fn convert_state_mapping() {
        assert_eq!(convert_state(RunState::Failed), StatusState::Failure);
        assert_eq!(convert_state(RunState::Pending), StatusState::Pending);
        assert_eq!(convert_state(RunState::Successful), StatusState::Success);
        assert_eq!(convert_state(RunState::Error), StatusState::Unknown);
    }
}
