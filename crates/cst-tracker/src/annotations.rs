// annotations.rs — Well-known run annotations.
//
// Runs opt in to status reporting with `tekton.dev/git-status: "true"`;
// the remaining keys customise the published status.

use std::collections::HashMap;

/// Marks a run as notifiable when set to exactly "true".
pub const NOTIFIABLE: &str = "tekton.dev/git-status";

/// Context (label) of the published status.
pub const STATUS_CONTEXT: &str = "tekton.dev/status-context";

/// Description of the published status.
pub const STATUS_DESCRIPTION: &str = "tekton.dev/status-description";

/// Link attached to the published status.
pub const STATUS_TARGET_URL: &str = "tekton.dev/status-target-url";

/// Look up an annotation, falling back to `default` when absent.
pub fn annotation_or<'a>(
    annotations: &'a HashMap<String, String>,
    key: &str,
    default: &'a str,
) -> &'a str {
    annotations.get(key).map(String::as_str).unwrap_or(default)
}

/// Whether the annotations opt the run in to status reporting.
pub fn is_notifiable(annotations: &HashMap<String, String>) -> bool {
    annotations.get(NOTIFIABLE).is_some_and(|v| v == "true")
}
