// run_state.rs — Deriving a run's outcome from its condition history.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::run::{Condition, ConditionStatus};

/// Condition type that carries overall completion.
pub const CONDITION_SUCCEEDED: &str = "Succeeded";

/// Outcome of a run, as far as status reporting is concerned.
///
/// `Error` is never produced by [`conditions_to_state`]; it is kept for
/// runs that die outside their normal condition reporting (e.g. OOM kills).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Pending,
    Failed,
    Successful,
    Error,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => write!(f, "Pending"),
            RunState::Failed => write!(f, "Failed"),
            RunState::Successful => write!(f, "Successful"),
            RunState::Error => write!(f, "Error"),
        }
    }
}

/// Map a condition history onto a [`RunState`].
///
/// Only the first `Succeeded` condition is considered. No such condition
/// means the run hasn't reported yet, i.e. `Pending`.
pub fn conditions_to_state(conditions: &[Condition]) -> RunState {
    conditions
        .iter()
        .find(|c| c.condition_type == CONDITION_SUCCEEDED)
        .map(|c| match c.status {
            ConditionStatus::False => RunState::Failed,
            ConditionStatus::True => RunState::Successful,
            ConditionStatus::Unknown => RunState::Pending,
        })
        .unwrap_or_default()
}
