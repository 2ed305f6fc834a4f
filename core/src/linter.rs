//! JsonLint: the process adapter between editor documents and the validator.
//!
//! Construction IS initialization: [`JsonLint::start`] checks the install and
//! kicks off a background install when needed. No separate `init()` step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jsonlint_types::{DocumentUri, LintResult, TextDocument, ValidatorSettings};
use tokio::sync::OnceCell;

use crate::diagnostics::DiagnosticsSnapshot;
use crate::host::{EditorHost, NotificationRequest};
use crate::install::{self, InstallState};
use crate::probe::{PathProbe, WhichProbe};
use crate::process::{self, ValidatorCommand};
use crate::reporter::Reporter;

/// Identifier of the "runner not found" notification.
pub const RUNNER_NOT_FOUND_ID: &str = "jsonlint.runnerNotFound";

/// Index of the "Help" action, which opens the configuration.
pub const HELP_ACTION: usize = 1;

pub struct JsonLint {
    settings: ValidatorSettings,
    host: Arc<dyn EditorHost>,
    reporter: Reporter,
    probe: Box<dyn PathProbe>,
    /// Set once by the first lint attempt; concurrent first attempts share one probe.
    runner_reachable: OnceCell<bool>,
    did_notify: AtomicBool,
    install_state: Arc<Mutex<InstallState>>,
}

impl JsonLint {
    /// Build the adapter, probing the runner with `which`.
    pub async fn start(settings: ValidatorSettings, host: Arc<dyn EditorHost>) -> Arc<Self> {
        Self::start_with_probe(settings, host, Box::new(WhichProbe)).await
    }

    /// Build the adapter with a custom runner probe.
    ///
    /// If the validator isn't installed, installation runs on a background
    /// task; failures are logged and linting is still attempted.
    pub async fn start_with_probe(
        settings: ValidatorSettings,
        host: Arc<dyn EditorHost>,
        probe: Box<dyn PathProbe>,
    ) -> Arc<Self> {
        let installed = install::is_installed(&settings).await;
        let initial = if installed {
            InstallState::Ready
        } else {
            InstallState::NotInstalled
        };

        let linter = Arc::new(Self {
            reporter: Reporter::new(host.clone()),
            settings,
            host,
            probe,
            runner_reachable: OnceCell::new(),
            did_notify: AtomicBool::new(false),
            install_state: Arc::new(Mutex::new(initial)),
        });

        if !installed {
            linter.spawn_install();
        }

        linter
    }

    fn spawn_install(&self) {
        let settings = self.settings.clone();
        let state = Arc::clone(&self.install_state);
        set_state(&state, InstallState::Installing);
        tracing::info!(
            "Installing {} into {}...",
            settings.package(),
            settings.install_dir().display()
        );

        tokio::spawn(async move {
            match install::install(&settings).await {
                Ok(()) => {
                    tracing::info!("{} installed", settings.package());
                    set_state(&state, InstallState::Ready);
                }
                Err(e) => {
                    tracing::error!("Failed to install {}: {e}", settings.package());
                    set_state(&state, InstallState::Failed);
                }
            }
        });
    }

    #[must_use]
    pub fn install_state(&self) -> InstallState {
        *self
            .install_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    #[must_use]
    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.reporter.snapshot()
    }

    /// Lint a document if its syntax tag is the configured one.
    ///
    /// Other documents are skipped without touching their diagnostics.
    pub async fn lint_document(&self, document: &TextDocument) {
        if document.syntax() != self.settings.syntax() {
            tracing::trace!(
                uri = %document.uri(),
                syntax = document.syntax(),
                "Skipping non-JSON document"
            );
            return;
        }

        self.check_runner().await;
        self.lint_text(document.text(), document.uri()).await;
    }

    /// Run the validator over `text` and report the outcome for `uri`.
    ///
    /// Every completed run reports, even with no results, so fixed documents
    /// lose their stale issues. A run that can't start reports nothing.
    pub async fn lint_text(&self, text: &str, uri: &DocumentUri) {
        if self.install_state() != InstallState::Ready {
            tracing::debug!(
                state = ?self.install_state(),
                "Linting before {} is installed",
                self.settings.package()
            );
        }

        let ticket = self.reporter.begin(uri);
        let command = ValidatorCommand::from_settings(&self.settings);
        match process::run_validator(&command, text).await {
            Ok(run) => {
                let results = run.results();
                tracing::debug!(
                    uri = %uri,
                    success = run.success(),
                    issues = results.len(),
                    "Lint run finished"
                );
                self.reporter.report_run(&ticket, &results);
            }
            Err(e) => {
                tracing::warn!(uri = %uri, "Lint run failed: {e}");
                self.reporter.abandon(&ticket);
            }
        }
    }

    /// Replace the diagnostics for `uri`.
    pub fn report(&self, results: &[LintResult], uri: &DocumentUri) {
        self.reporter.report(uri, results);
    }

    /// Drop every diagnostic for `uri`.
    pub fn remove_issues(&self, uri: &DocumentUri) {
        if !self.reporter.remove_issues(uri) {
            tracing::trace!(uri = %uri, "No diagnostics to remove");
        }
    }

    /// Probe the runner once; on the first miss, tell the user once.
    async fn check_runner(&self) {
        let runner = self.settings.runner();
        let reachable = *self
            .runner_reachable
            .get_or_init(|| self.probe.is_reachable(runner))
            .await;

        if !reachable && !self.did_notify.swap(true, Ordering::SeqCst) {
            tracing::warn!("{runner} not found in PATH");
            self.spawn_runner_notification();
        }
    }

    /// Show the "runner not found" notification without holding up linting.
    fn spawn_runner_notification(&self) {
        let host = Arc::clone(&self.host);
        let request = NotificationRequest::new(
            RUNNER_NOT_FOUND_ID,
            "NPM Not Found",
            format!(
                "JSONLint requires NPM and Node.js. Please download and install the latest \
                 version of Node.js, or verify that {} can be found on $PATH.",
                self.settings.runner()
            ),
            vec!["OK".to_string(), "Help".to_string()],
        );

        tokio::spawn(async move {
            match host.show_notification(request).await {
                Ok(response) if response.action_index() == Some(HELP_ACTION) => {
                    if let Err(e) = host.open_config() {
                        tracing::warn!("Failed to open configuration: {e}");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Failed to show runner notification: {e}");
                }
            }
        });
    }
}

fn set_state(state: &Mutex<InstallState>, next: InstallState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::host::BoxFut;
    use crate::reporter::tests::{HostCall, RecordingHost};
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Probe double with a fixed answer that counts how often it runs.
    struct CountingProbe {
        reachable: bool,
        calls: Arc<AtomicUsize>,
    }

    impl PathProbe for CountingProbe {
        fn is_reachable<'a>(&'a self, _program: &'a str) -> BoxFut<'a, bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reachable = self.reachable;
            Box::pin(async move {
                tokio::task::yield_now().await;
                reachable
            })
        }
    }

    /// Settings running `sh validator.sh -c` inside `dir`, marked as installed.
    fn validator(dir: &Path, script: &str) -> ValidatorSettings {
        std::fs::write(dir.join("validator.sh"), script).unwrap();
        let settings = ValidatorSettings::new(
            "validator.sh",
            "sh",
            "jsonlint-ls-no-such-installer",
            vec!["-c".to_string()],
            dir,
            "json",
        )
        .unwrap();
        let bin = settings.installed_bin();
        std::fs::create_dir_all(bin.parent().unwrap()).unwrap();
        std::fs::write(bin, "").unwrap();
        settings
    }

    const FAILING: &str = "cat >/dev/null\necho \"line 3, col 10, found: ']' - expected: ','\"\nexit 1\n";
    const PASSING: &str = "cat >/dev/null\nexit 0\n";

    async fn linter_with(
        settings: ValidatorSettings,
        host: Arc<RecordingHost>,
        reachable: bool,
    ) -> (Arc<JsonLint>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = CountingProbe {
            reachable,
            calls: calls.clone(),
        };
        let linter = JsonLint::start_with_probe(settings, host, Box::new(probe)).await;
        (linter, calls)
    }

    fn json_doc(text: &str) -> TextDocument {
        TextDocument::new("file:///tmp/doc.json", "json", text)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn invalid_document_gets_one_error() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, _) = linter_with(validator(dir.path(), FAILING), host.clone(), true).await;

        linter.lint_document(&json_doc("[1,]")).await;

        let issues = linter.reporter().issues_for(json_doc("").uri()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line(), 3);
        assert_eq!(issues[0].column(), 11);
        assert_eq!(issues[0].message(), "Found \"]\"; Expected ,");
        assert!(matches!(host.calls()[0], HostCall::Publish(_, ref items) if items.len() == 1));
    }

    #[tokio::test]
    async fn valid_document_reports_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, _) = linter_with(validator(dir.path(), PASSING), host.clone(), true).await;

        linter.lint_document(&json_doc("{}")).await;

        assert_eq!(
            host.calls(),
            vec![HostCall::Publish(DocumentUri::new("file:///tmp/doc.json"), Vec::new())]
        );
    }

    #[tokio::test]
    async fn unparseable_failure_clears_previous_issues() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::default());
        let garbage = "cat >/dev/null\necho 'Error: something unexpected'\nexit 1\n";
        let (linter, _) = linter_with(validator(dir.path(), garbage), host.clone(), true).await;
        let doc = json_doc("[1,]");

        linter.report(&[LintResult::new(1, 0, "x", "y")], doc.uri());
        assert_eq!(linter.snapshot().error_count(), 1);

        linter.lint_document(&doc).await;

        assert_eq!(
            host.calls().last(),
            Some(&HostCall::Publish(doc.uri().clone(), Vec::new()))
        );
        assert_eq!(linter.reporter().issues_for(doc.uri()), Some(Vec::new()));
    }

    #[tokio::test]
    async fn non_json_document_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, probes) = linter_with(validator(dir.path(), FAILING), host.clone(), false).await;

        let doc = TextDocument::new("file:///tmp/notes.txt", "plaintext", "[1,]");
        linter.lint_document(&doc).await;
        linter.remove_issues(doc.uri());
        settle().await;

        assert!(host.calls().is_empty());
        assert_eq!(probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn runner_probe_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, probes) = linter_with(validator(dir.path(), PASSING), host, true).await;

        let (object, array) = (json_doc("{}"), json_doc("[]"));
        tokio::join!(linter.lint_document(&object), linter.lint_document(&array));
        linter.lint_document(&json_doc("1")).await;

        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_runner_notifies_once_and_still_lints() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, probes) = linter_with(validator(dir.path(), FAILING), host.clone(), false).await;

        for _ in 0..3 {
            linter.lint_document(&json_doc("[1,]")).await;
        }
        settle().await;

        let calls = host.calls();
        let notifications: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Notify(req) => Some(req),
                _ => None,
            })
            .collect();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].id(), RUNNER_NOT_FOUND_ID);
        assert_eq!(notifications[0].title(), "NPM Not Found");
        assert_eq!(notifications[0].actions(), ["OK", "Help"]);
        assert_eq!(
            calls
                .iter()
                .filter(|c| matches!(c, HostCall::Publish(..)))
                .count(),
            3
        );
        assert!(!calls.contains(&HostCall::OpenConfig));
        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn help_action_opens_config() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::answering(HELP_ACTION));
        let (linter, _) = linter_with(validator(dir.path(), PASSING), host.clone(), false).await;

        linter.lint_document(&json_doc("{}")).await;
        settle().await;

        assert!(host.calls().contains(&HostCall::OpenConfig));
    }

    #[tokio::test]
    async fn notification_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::failing());
        let (linter, _) = linter_with(validator(dir.path(), FAILING), host.clone(), false).await;

        linter.lint_document(&json_doc("[1,]")).await;
        settle().await;

        assert!(!host.calls().contains(&HostCall::OpenConfig));
        assert_eq!(linter.snapshot().error_count(), 1);
    }

    #[tokio::test]
    async fn start_failure_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ValidatorSettings::new(
            "jsonlint",
            "jsonlint-ls-no-such-runner",
            "npm",
            vec!["-c".to_string()],
            dir.path(),
            "json",
        )
        .unwrap();
        std::fs::create_dir_all(settings.installed_bin().parent().unwrap()).unwrap();
        std::fs::write(settings.installed_bin(), "").unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, _) = linter_with(settings, host.clone(), true).await;

        linter.lint_document(&json_doc("[1,]")).await;

        assert!(host.calls().is_empty());
        assert!(linter.snapshot().is_empty());
    }

    #[tokio::test]
    async fn missing_install_fails_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ValidatorSettings::new(
            "jsonlint",
            "sh",
            "jsonlint-ls-no-such-installer",
            vec![],
            dir.path(),
            "json",
        )
        .unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, _) = linter_with(settings, host, true).await;
        assert_eq!(linter.install_state(), InstallState::Installing);

        for _ in 0..50 {
            if linter.install_state() == InstallState::Failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(linter.install_state(), InstallState::Failed);
    }

    #[tokio::test]
    async fn installed_validator_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::default());
        let (linter, _) = linter_with(validator(dir.path(), PASSING), host, true).await;
        assert_eq!(linter.install_state(), InstallState::Ready);
    }
}
