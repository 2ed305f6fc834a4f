//! Coordinator: binds editor lifecycle events to the linter.
//!
//! Events arrive on a channel and are handled one at a time. Each lint runs
//! on its own task, so several runs for the same document can be in flight;
//! the [`Reporter`](crate::Reporter) decides which result wins.

use std::collections::HashMap;
use std::sync::Arc;

use jsonlint_types::{DocumentUri, EditorId, TextDocument};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::linter::JsonLint;

/// Channel capacity between the editor frontend and the coordinator task.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Editor lifecycle events the linter reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A new editor opened on `document`.
    EditorAdded {
        editor: EditorId,
        document: TextDocument,
    },
    /// The editor's contents settled after an edit.
    StoppedChanging {
        editor: EditorId,
        document: TextDocument,
    },
    /// The document's syntax tag changed.
    SyntaxChanged {
        editor: EditorId,
        document: TextDocument,
    },
    /// The editor closed.
    EditorDestroyed { editor: EditorId },
}

pub struct Coordinator {
    linter: Arc<JsonLint>,
    /// Open editors and the document each one shows.
    editors: HashMap<EditorId, DocumentUri>,
}

impl Coordinator {
    #[must_use]
    pub fn new(linter: Arc<JsonLint>) -> Self {
        Self {
            linter,
            editors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn linter(&self) -> &Arc<JsonLint> {
        &self.linter
    }

    /// Whether any open editor shows `uri`.
    #[must_use]
    pub fn is_open(&self, uri: &DocumentUri) -> bool {
        self.editors.values().any(|open| open == uri)
    }

    /// React to one event. Returns the lint task it started, if any.
    pub fn handle_event(&mut self, event: EditorEvent) -> Option<JoinHandle<()>> {
        match event {
            EditorEvent::EditorAdded { editor, document } => {
                tracing::debug!(%editor, uri = %document.uri(), "Editor added");
                self.editors.insert(editor, document.uri().clone());
                Some(self.spawn_lint(document))
            }
            EditorEvent::StoppedChanging { editor, document }
            | EditorEvent::SyntaxChanged { editor, document } => {
                if !self.editors.contains_key(&editor) {
                    tracing::debug!(%editor, "Event for an editor that was never added");
                }
                Some(self.spawn_lint(document))
            }
            EditorEvent::EditorDestroyed { editor } => {
                self.on_editor_destroyed(editor);
                None
            }
        }
    }

    fn spawn_lint(&self, document: TextDocument) -> JoinHandle<()> {
        let linter = Arc::clone(&self.linter);
        tokio::spawn(async move {
            linter.lint_document(&document).await;
        })
    }

    /// Clear diagnostics unless another editor still shows the same document.
    fn on_editor_destroyed(&mut self, editor: EditorId) {
        let Some(uri) = self.editors.remove(&editor) else {
            tracing::debug!(%editor, "Destroyed editor was never added");
            return;
        };

        if self.is_open(&uri) {
            tracing::debug!(%editor, uri = %uri, "Document still open elsewhere; keeping diagnostics");
            return;
        }

        self.linter.remove_issues(&uri);
    }

    /// Run the coordinator on its own task.
    ///
    /// The returned handle is the subscription: events go in through it, and
    /// dropping every sender (or calling [`CoordinatorHandle::shutdown`]) ends
    /// the task.
    pub fn spawn(mut self) -> CoordinatorHandle {
        let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                self.handle_event(event);
            }
            tracing::debug!("Editor event channel closed; coordinator stopping");
        });
        CoordinatorHandle { event_tx, task }
    }
}

/// Handle to a running [`Coordinator`].
pub struct CoordinatorHandle {
    event_tx: mpsc::Sender<EditorEvent>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// A sender for editor events, for frontends that outlive this handle.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<EditorEvent> {
        self.event_tx.clone()
    }

    /// Deliver one event. Fails only if the coordinator task has stopped.
    pub async fn send(&self, event: EditorEvent) -> Result<(), mpsc::error::SendError<EditorEvent>> {
        self.event_tx.send(event).await
    }

    /// Stop accepting events and wait for the coordinator to drain.
    ///
    /// Lint runs already spawned keep going to completion.
    pub async fn shutdown(self) {
        drop(self.event_tx);
        if let Err(e) = self.task.await {
            tracing::warn!("Coordinator task ended abnormally: {e}");
        }
    }
}
