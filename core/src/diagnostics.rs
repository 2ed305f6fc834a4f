//! Diagnostics store: the active diagnostic set per document URI.

use std::collections::HashMap;

use jsonlint_types::{DocumentUri, LintDiagnostic};

/// Per-URI diagnostics. A `set` replaces, never merges.
///
/// Unlike a plain cache, an empty `set` keeps the entry: "linted, clean" is
/// distinct from "never linted / removed".
#[derive(Debug, Default)]
pub struct DiagnosticsStore {
    data: HashMap<DocumentUri, Vec<LintDiagnostic>>,
}

impl DiagnosticsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, uri: DocumentUri, items: Vec<LintDiagnostic>) {
        self.data.insert(uri, items);
    }

    /// Returns whether an entry existed.
    pub fn remove(&mut self, uri: &DocumentUri) -> bool {
        self.data.remove(uri).is_some()
    }

    #[must_use]
    pub fn get(&self, uri: &DocumentUri) -> Option<&[LintDiagnostic]> {
        self.data.get(uri).map(Vec::as_slice)
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let files = self
            .data
            .iter()
            .map(|(uri, items)| (uri.clone(), items.clone()))
            .collect();
        DiagnosticsSnapshot { files }
    }
}

/// Immutable copy of the store.
///
/// Counts are computed from `files` rather than cached alongside it.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    files: Vec<(DocumentUri, Vec<LintDiagnostic>)>,
}

impl DiagnosticsSnapshot {
    /// No document is tracked at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.files
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|d| d.severity().is_error())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonlint_types::LintResult;

    fn make_diag(line: u32) -> LintDiagnostic {
        LintDiagnostic::from_result(&LintResult::new(line, 0, "x", "y"))
    }

    #[test]
    fn test_empty_snapshot() {
        let store = DiagnosticsStore::new();
        let snap = store.snapshot();
        assert!(snap.is_empty());
        assert_eq!(snap.error_count(), 0);
    }

    #[test]
    fn test_set_replaces_previous() {
        let mut store = DiagnosticsStore::new();
        let uri = DocumentUri::new("file:///a.json");
        store.set(uri.clone(), vec![make_diag(1), make_diag(2)]);
        assert_eq!(store.snapshot().error_count(), 2);

        store.set(uri.clone(), vec![make_diag(7)]);
        assert_eq!(store.get(&uri).unwrap(), [make_diag(7)]);
    }

    #[test]
    fn test_empty_set_keeps_entry() {
        let mut store = DiagnosticsStore::new();
        let uri = DocumentUri::new("file:///a.json");
        store.set(uri.clone(), vec![make_diag(1)]);
        store.set(uri.clone(), vec![]);
        assert_eq!(store.get(&uri).unwrap().len(), 0);
        let snap = store.snapshot();
        assert!(!snap.is_empty());
        assert_eq!(snap.error_count(), 0);
    }

    #[test]
    fn test_remove_drops_entry() {
        let mut store = DiagnosticsStore::new();
        let uri = DocumentUri::new("file:///a.json");
        store.set(uri.clone(), vec![make_diag(1)]);
        assert!(store.remove(&uri));
        assert!(store.get(&uri).is_none());
        assert!(!store.remove(&uri));
    }

    #[test]
    fn test_error_count_spans_documents() {
        let mut store = DiagnosticsStore::new();
        store.set(DocumentUri::new("file:///a.json"), vec![]);
        store.set(DocumentUri::new("file:///b.json"), vec![make_diag(1)]);
        store.set(DocumentUri::new("file:///c.json"), vec![make_diag(2)]);
        assert_eq!(store.snapshot().error_count(), 2);
    }
}
