// hasher.rs — Notification keys.
//
// A key identifies "this ref in this repo", independent of which run
// produced the status. It's a lowercase hex SHA-256 of `<repo>:<ref>`.

use sha2::{Digest, Sha256};

/// Key under which the last notified state for a commit is tracked.
pub fn key_for_commit(repo: &str, git_ref: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repo.as_bytes());
    hasher.update(b":");
    hasher.update(git_ref.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_determinism() {
        assert_eq!(
            key_for_commit("tektoncd/triggers", "master"),
            key_for_commit("tektoncd/triggers", "master")
        );
    }

    #[test]
    fn key_uniqueness() {
        assert_ne!(
            key_for_commit("tektoncd/triggers", "master"),
            key_for_commit("tektoncd/triggers", "main")
        );
        assert_ne!(
            key_for_commit("org/a", "master"),
            key_for_commit("org/b", "master")
        );
    }

    #[test]
    fn key_known_value() {
        // SHA-256("tektoncd/triggers:master")
        assert_eq!(
            key_for_commit("tektoncd/triggers", "master"),
            "12790e80e18a0b7df33f216441571970389c39c26d30b0369077e9668a3b4286"
        );
        // SHA-256(":")
        assert_eq!(
            key_for_commit("", ""),
            "e7ac0786668e0ff0f02b62bd04f45ff636fd82db63b1104601c975dc005f3a67"
        );
    }
}
