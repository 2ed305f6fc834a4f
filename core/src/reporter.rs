//! Reporter: turns lint results into diagnostics and keeps the host in sync.
//!
//! Lint runs for one URI are not serialized, so a slow run can finish after
//! a newer one. Every run takes a [`LintTicket`] when it starts; when it
//! finishes, its results are applied only if no newer run has already been
//! applied and the URI hasn't been removed since the ticket was issued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jsonlint_types::{DocumentUri, LintDiagnostic, LintResult};

use crate::diagnostics::{DiagnosticsSnapshot, DiagnosticsStore};
use crate::host::EditorHost;

/// Start-ordered token for one lint run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintTicket {
    uri: DocumentUri,
    seq: u64,
}

impl LintTicket {
    #[must_use]
    pub fn uri(&self) -> &DocumentUri {
        &self.uri
    }
}

#[derive(Default)]
struct ReporterState {
    store: DiagnosticsStore,
    next_seq: u64,
    /// Newest sequence number applied to or invalidated for a URI. Only kept
    /// while the URI has tickets outstanding.
    watermark: HashMap<DocumentUri, u64>,
    /// Tickets issued for a URI that haven't been applied or abandoned.
    live: HashMap<DocumentUri, usize>,
}

impl ReporterState {
    fn apply(&mut self, host: &dyn EditorHost, uri: &DocumentUri, results: &[LintResult]) {
        let items: Vec<LintDiagnostic> = results.iter().map(LintDiagnostic::from_result).collect();
        tracing::debug!(uri = %uri, count = items.len(), "Diagnostics updated");
        host.publish_issues(uri, &items);
        self.store.set(uri.clone(), items);
    }

    /// Invalidate every ticket issued for `uri` so far.
    fn invalidate(&mut self, uri: &DocumentUri) {
        if self.live.contains_key(uri) {
            let seq = self.next_seq;
            self.watermark.insert(uri.clone(), seq);
        }
    }

    /// Retire one ticket. The watermark goes with the last one: any later
    /// ticket is newer than it anyway.
    fn finish(&mut self, uri: &DocumentUri) {
        let Some(count) = self.live.get_mut(uri) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.live.remove(uri);
            self.watermark.remove(uri);
        }
    }
}

pub struct Reporter {
    host: Arc<dyn EditorHost>,
    state: Mutex<ReporterState>,
}

impl Reporter {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self {
            host,
            state: Mutex::new(ReporterState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ReporterState> {
        // The state is plain data; a panic mid-update leaves nothing half-written
        // that a later report wouldn't overwrite.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a ticket for a lint run that is about to start.
    ///
    /// Every ticket must end in [`Reporter::report_run`] or [`Reporter::abandon`].
    pub fn begin(&self, uri: &DocumentUri) -> LintTicket {
        let mut state = self.state();
        state.next_seq += 1;
        let seq = state.next_seq;
        *state.live.entry(uri.clone()).or_default() += 1;
        LintTicket {
            uri: uri.clone(),
            seq,
        }
    }

    /// Replace the diagnostic set for `uri` with `results` (possibly empty).
    ///
    /// Also invalidates every ticket issued for `uri` so far.
    pub fn report(&self, uri: &DocumentUri, results: &[LintResult]) {
        let mut state = self.state();
        state.invalidate(uri);
        state.apply(self.host.as_ref(), uri, results);
    }

    /// Apply the results of a finished run unless they are stale.
    ///
    /// Returns whether the results were applied.
    pub fn report_run(&self, ticket: &LintTicket, results: &[LintResult]) -> bool {
        let mut state = self.state();
        let stale = state
            .watermark
            .get(&ticket.uri)
            .is_some_and(|&newest| ticket.seq <= newest);
        if stale {
            tracing::debug!(uri = %ticket.uri, "Dropping stale lint results");
        } else {
            state.watermark.insert(ticket.uri.clone(), ticket.seq);
            state.apply(self.host.as_ref(), &ticket.uri, results);
        }
        state.finish(&ticket.uri);
        !stale
    }

    /// Retire a run that produced nothing to report.
    pub fn abandon(&self, ticket: &LintTicket) {
        self.state().finish(&ticket.uri);
    }

    /// Delete the diagnostic set for `uri` and invalidate runs still in flight.
    ///
    /// The host is told only when an entry existed. Returns whether there was
    /// an entry or an outstanding run.
    pub fn remove_issues(&self, uri: &DocumentUri) -> bool {
        let mut state = self.state();
        let had_entry = state.store.remove(uri);
        let had_run = state.live.contains_key(uri);
        state.invalidate(uri);

        if had_entry {
            tracing::debug!(uri = %uri, "Diagnostics removed");
            self.host.clear_issues(uri);
        }
        had_entry || had_run
    }

    /// Current diagnostics for `uri`, if it is tracked.
    #[must_use]
    pub fn issues_for(&self, uri: &DocumentUri) -> Option<Vec<LintDiagnostic>> {
        self.state().store.get(uri).map(<[LintDiagnostic]>::to_vec)
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.state().store.snapshot()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::{BoxFut, NotificationRequest, NotificationResponse};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum HostCall {
        Publish(DocumentUri, Vec<LintDiagnostic>),
        Clear(DocumentUri),
        Notify(NotificationRequest),
        OpenConfig,
    }

    /// Host double that records every call and answers notifications with
    /// a fixed action.
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        calls: Mutex<Vec<HostCall>>,
        answer: Option<usize>,
        fail_notifications: bool,
    }

    impl RecordingHost {
        pub(crate) fn answering(action: usize) -> Self {
            Self {
                answer: Some(action),
                ..Self::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail_notifications: true,
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<HostCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: HostCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl EditorHost for RecordingHost {
        fn publish_issues(&self, uri: &DocumentUri, issues: &[LintDiagnostic]) {
            self.record(HostCall::Publish(uri.clone(), issues.to_vec()));
        }

        fn clear_issues(&self, uri: &DocumentUri) {
            self.record(HostCall::Clear(uri.clone()));
        }

        fn show_notification(
            &self,
            request: NotificationRequest,
        ) -> BoxFut<'_, Result<NotificationResponse, HostError>> {
            self.record(HostCall::Notify(request));
            let result = if self.fail_notifications {
                Err(HostError::Disconnected)
            } else {
                Ok(NotificationResponse::new(self.answer))
            };
            Box::pin(async move { result })
        }

        fn open_config(&self) -> Result<(), HostError> {
            self.record(HostCall::OpenConfig);
            Ok(())
        }
    }

    fn uri() -> DocumentUri {
        DocumentUri::new("file:///tmp/a.json")
    }

    fn setup() -> (Arc<RecordingHost>, Reporter) {
        let host = Arc::new(RecordingHost::default());
        let reporter = Reporter::new(host.clone());
        (host, reporter)
    }

    #[test]
    fn report_publishes_derived_diagnostics() {
        let (host, reporter) = setup();
        reporter.report(&uri(), &[LintResult::new(3, 10, "]", ",")]);

        let calls = host.calls();
        assert_eq!(calls.len(), 1);
        let HostCall::Publish(published_uri, items) = &calls[0] else {
            panic!("expected publish, got {:?}", calls[0]);
        };
        assert_eq!(published_uri, &uri());
        assert_eq!(items[0].column(), 11);
        assert_eq!(items[0].message(), "Found \"]\"; Expected ,");
        assert_eq!(reporter.issues_for(&uri()).unwrap().len(), 1);
    }

    #[test]
    fn empty_report_clears_previous_issues() {
        let (host, reporter) = setup();
        reporter.report(&uri(), &[LintResult::new(1, 0, "x", "y")]);
        reporter.report(&uri(), &[]);

        assert_eq!(
            host.calls().last(),
            Some(&HostCall::Publish(uri(), Vec::new()))
        );
        assert_eq!(reporter.issues_for(&uri()), Some(Vec::new()));
    }

    #[test]
    fn remove_issues_drops_entry_and_tells_host() {
        let (host, reporter) = setup();
        reporter.report(&uri(), &[LintResult::new(1, 0, "x", "y")]);
        assert!(reporter.remove_issues(&uri()));
        assert_eq!(host.calls().last(), Some(&HostCall::Clear(uri())));
        assert!(reporter.issues_for(&uri()).is_none());
        assert!(reporter.snapshot().is_empty());
    }

    #[test]
    fn remove_issues_on_untracked_uri_is_silent() {
        let (host, reporter) = setup();
        assert!(!reporter.remove_issues(&uri()));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn newer_run_wins_over_slower_older_run() {
        let (host, reporter) = setup();
        let older = reporter.begin(&uri());
        let newer = reporter.begin(&uri());

        assert!(reporter.report_run(&newer, &[]));
        assert!(!reporter.report_run(&older, &[LintResult::new(1, 0, "x", "y")]));

        assert_eq!(host.calls(), vec![HostCall::Publish(uri(), Vec::new())]);
        assert_eq!(reporter.issues_for(&uri()), Some(Vec::new()));
    }

    #[test]
    fn runs_finishing_in_order_all_apply() {
        let (host, reporter) = setup();
        let first = reporter.begin(&uri());
        let second = reporter.begin(&uri());
        assert!(reporter.report_run(&first, &[LintResult::new(1, 0, "x", "y")]));
        assert!(reporter.report_run(&second, &[]));
        assert_eq!(host.calls().len(), 2);
    }

    #[test]
    fn removal_invalidates_in_flight_runs() {
        let (host, reporter) = setup();
        let ticket = reporter.begin(&uri());
        assert!(reporter.remove_issues(&uri()));
        assert!(!reporter.report_run(&ticket, &[LintResult::new(1, 0, "x", "y")]));
        assert!(host.calls().is_empty());
        assert!(reporter.issues_for(&uri()).is_none());
    }

    #[test]
    fn removal_invalidates_older_run_after_newer_is_abandoned() {
        let (host, reporter) = setup();
        let older = reporter.begin(&uri());
        let newer = reporter.begin(&uri());
        reporter.abandon(&newer);

        assert!(reporter.remove_issues(&uri()));
        assert!(!reporter.report_run(&older, &[LintResult::new(1, 0, "x", "y")]));
        assert!(reporter.issues_for(&uri()).is_none());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn removal_after_report_clears_and_blocks_pending_run() {
        let (host, reporter) = setup();
        reporter.report(&uri(), &[LintResult::new(1, 0, "x", "y")]);
        let pending = reporter.begin(&uri());
        assert!(reporter.remove_issues(&uri()));
        assert!(!reporter.report_run(&pending, &[]));
        assert_eq!(host.calls().last(), Some(&HostCall::Clear(uri())));
        assert!(reporter.issues_for(&uri()).is_none());
    }

    #[test]
    fn settled_runs_leave_no_bookkeeping() {
        let (_host, reporter) = setup();
        let other = DocumentUri::new("file:///tmp/b.json");
        let first = reporter.begin(&uri());
        let second = reporter.begin(&uri());
        let dropped = reporter.begin(&other);

        assert!(reporter.report_run(&second, &[]));
        assert!(!reporter.report_run(&first, &[]));
        reporter.abandon(&dropped);
        reporter.remove_issues(&uri());

        let state = reporter.state();
        assert!(state.watermark.is_empty());
        assert!(state.live.is_empty());
    }

    #[test]
    fn fresh_ticket_after_settling_still_applies() {
        let (_host, reporter) = setup();
        let first = reporter.begin(&uri());
        assert!(reporter.report_run(&first, &[]));
        reporter.remove_issues(&uri());

        let next = reporter.begin(&uri());
        assert!(reporter.report_run(&next, &[LintResult::new(2, 0, "x", "y")]));
        assert_eq!(reporter.issues_for(&uri()).map(|v| v.len()), Some(1));
    }

    #[test]
    fn direct_report_outranks_runs_started_before_it() {
        let (_host, reporter) = setup();
        let ticket = reporter.begin(&uri());
        reporter.report(&uri(), &[]);
        assert!(!reporter.report_run(&ticket, &[LintResult::new(1, 0, "x", "y")]));
        assert_eq!(reporter.issues_for(&uri()), Some(Vec::new()));
    }

    #[test]
    fn abandoned_run_leaves_nothing_to_remove() {
        let (host, reporter) = setup();
        let ticket = reporter.begin(&uri());
        reporter.abandon(&ticket);
        assert!(!reporter.remove_issues(&uri()));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn tickets_are_per_uri() {
        let (_host, reporter) = setup();
        let other = DocumentUri::new("file:///tmp/b.json");
        let a = reporter.begin(&uri());
        let b = reporter.begin(&other);
        assert!(reporter.report_run(&b, &[]));
        assert!(reporter.report_run(&a, &[]));
        assert_eq!(a.uri(), &uri());
    }
}
