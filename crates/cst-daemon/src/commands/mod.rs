pub mod reconcile;
pub mod watch;

use cst_scm::{GitHubNotifier, NoneNotifier, NotifierFactory, StatusNotifier};
use cst_tracker::{FileRunStore, FileSecretStore, Reconciler, TrackerConfig};

/// Notifier factory for the configured service, or a logging-only one.
pub fn notifier_factory(config: &TrackerConfig, dry_run: bool) -> NotifierFactory {
    if dry_run {
        return Box::new(|_token: &str| Ok(Box::new(NoneNotifier::new()) as Box<dyn StatusNotifier>));
    }
    let scm = config.scm.clone();
    Box::new(move |token: &str| {
        Ok(Box::new(GitHubNotifier::new(token, &scm)?) as Box<dyn StatusNotifier>)
    })
}

/// Reconciler over the configured file stores.
pub fn build_reconciler(config: &TrackerConfig, dry_run: bool) -> Reconciler {
    Reconciler::new(
        Box::new(FileRunStore::new(&config.store.runs_dir)),
        Box::new(
            FileSecretStore::new(&config.store.secrets_dir)
                .with_names(&config.secret_name, &config.secret_key),
        ),
        notifier_factory(config, dry_run),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_uses_none_notifier() {
        let factory = notifier_factory(&TrackerConfig::default(), true);
        let notifier = factory("ignored").unwrap();
        assert_eq!(notifier.name(), "none");
    }

    #[test]
    fn live_factory_builds_github_notifier() {
        let factory = notifier_factory(&TrackerConfig::default(), false);
        let notifier = factory("abc123").unwrap();
        assert_eq!(notifier.name(), "github");
    }

    #[test]
    fn live_factory_rejects_unusable_token() {
        let factory = notifier_factory(&TrackerConfig::default(), false);
        assert!(factory("bad\ntoken").is_err());
    }
}
