//! One editor connection: LSP traffic in, editor events and diagnostics out.
//!
//! Each open URI is one editor. Full-text changes are buffered and only
//! forwarded as [`EditorEvent::StoppedChanging`] after the configured quiet
//! period, so typing doesn't start a validator per keystroke.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use jsonlint_core::{
    BoxFut, Coordinator, EditorEvent, EditorHost, HostError, JsonLint, NotificationRequest,
    NotificationResponse,
};
use jsonlint_types::{DocumentUri, EditorId, LintDiagnostic, LinterSettings, TextDocument};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::codec::{CodecError, FrameReader, FrameWriter};
use crate::protocol::{
    self, DidChangeParams, DidCloseParams, DidOpenParams, INVALID_REQUEST, Incoming,
    METHOD_NOT_FOUND, Notification, Request,
};

enum WriterCommand {
    Send(Value),
    Shutdown,
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// [`EditorHost`] backed by the LSP connection.
pub struct LspHost {
    // Unbounded: publish and clear are synchronous host callbacks.
    out: mpsc::UnboundedSender<WriterCommand>,
    pending: Pending,
    next_id: AtomicU64,
    config_path: Option<PathBuf>,
}

impl LspHost {
    fn new(
        out: mpsc::UnboundedSender<WriterCommand>,
        pending: Pending,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            out,
            pending,
            next_id: AtomicU64::new(1),
            config_path,
        }
    }

    fn send(&self, frame: Value) -> Result<(), HostError> {
        self.out
            .send(WriterCommand::Send(frame))
            .map_err(|_| HostError::Disconnected)
    }

    fn notify(&self, method: &'static str, params: Value) {
        let frame = match serde_json::to_value(Notification::new(method, params)) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Serializing {method}: {e}");
                return;
            }
        };
        if self.send(frame).is_err() {
            tracing::debug!("Dropping {method}: editor connection closed");
        }
    }

    fn send_request(&self, id: u64, method: &'static str, params: Value) -> Result<(), HostError> {
        let frame = serde_json::to_value(Request::new(id, method, params))
            .map_err(|e| HostError::Rejected(e.to_string()))?;
        self.send(frame)
    }

    /// Send a request and wait for the editor's reply.
    async fn request(&self, method: &'static str, params: Value) -> Result<Value, HostError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        // Register before sending so a fast reply can't miss its slot.
        self.pending.lock().await.insert(id, tx);
        if let Err(e) = self.send_request(id, method, params) {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }
        rx.await.map_err(|_| HostError::Disconnected)
    }
}

impl EditorHost for LspHost {
    fn publish_issues(&self, uri: &DocumentUri, issues: &[LintDiagnostic]) {
        self.notify(
            "textDocument/publishDiagnostics",
            protocol::publish_diagnostics_params(uri, issues),
        );
    }

    fn clear_issues(&self, uri: &DocumentUri) {
        self.publish_issues(uri, &[]);
    }

    fn show_notification(
        &self,
        request: NotificationRequest,
    ) -> BoxFut<'_, Result<NotificationResponse, HostError>> {
        Box::pin(async move {
            let reply = self
                .request(
                    "window/showMessageRequest",
                    protocol::show_message_request_params(&request),
                )
                .await?;
            if let Some(error) = reply.get("error") {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                return Err(HostError::Rejected(message.to_string()));
            }
            Ok(NotificationResponse::new(protocol::chosen_action(
                &request, &reply,
            )))
        })
    }

    fn open_config(&self) -> Result<(), HostError> {
        let path = self
            .config_path
            .as_deref()
            .ok_or_else(|| HostError::Rejected("no configuration file location".to_string()))?;
        let uri =
            protocol::path_to_file_uri(path).map_err(|e| HostError::Rejected(e.to_string()))?;
        // The editor's reply only says whether it managed; nothing to do with it.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send_request(id, "window/showDocument", protocol::show_document_params(&uri))
    }
}

struct OpenDocument {
    editor: EditorId,
    syntax: String,
    text: String,
    debounce: Option<JoinHandle<()>>,
}

impl OpenDocument {
    fn snapshot(&self, uri: &DocumentUri) -> TextDocument {
        TextDocument::new(uri.clone(), self.syntax.clone(), self.text.clone())
    }

    fn cancel_debounce(&mut self) {
        if let Some(task) = self.debounce.take() {
            task.abort();
        }
    }
}

struct Session {
    events: mpsc::Sender<EditorEvent>,
    out: mpsc::UnboundedSender<WriterCommand>,
    pending: Pending,
    documents: HashMap<DocumentUri, OpenDocument>,
    next_editor: u64,
    debounce: Duration,
    shutdown_requested: bool,
}

impl Session {
    async fn run<R: AsyncRead + Unpin>(&mut self, mut reader: FrameReader<R>) -> Result<()> {
        loop {
            let frame = match reader.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Editor closed the connection");
                    return Ok(());
                }
                Err(CodecError::Json(e)) => {
                    tracing::warn!("Skipping frame with invalid JSON: {e}");
                    continue;
                }
                Err(e) => return Err(e).context("reading from editor"),
            };

            match protocol::classify(&frame) {
                Some(Incoming::Request { id, method }) => self.on_request(&id, &method),
                Some(Incoming::Notification { method, .. }) if method == "exit" => {
                    if !self.shutdown_requested {
                        tracing::warn!("Exit without shutdown");
                    }
                    return Ok(());
                }
                Some(Incoming::Notification { method, params }) => {
                    self.on_notification(&method, params).await;
                }
                Some(Incoming::Response { id, body }) => {
                    match self.pending.lock().await.remove(&id) {
                        Some(tx) => {
                            let _ = tx.send(body);
                        }
                        None => tracing::trace!(id, "Reply to a request nobody waits on"),
                    }
                }
                None => tracing::debug!("Ignoring malformed JSON-RPC frame"),
            }
        }
    }

    fn reply(&self, frame: Value) {
        if self.out.send(WriterCommand::Send(frame)).is_err() {
            tracing::debug!("Writer gone; dropping reply");
        }
    }

    fn on_request(&mut self, id: &Value, method: &str) {
        if self.shutdown_requested {
            self.reply(protocol::error_response(
                id,
                INVALID_REQUEST,
                "server is shutting down",
            ));
            return;
        }

        let frame = match method {
            "initialize" => protocol::response(id, protocol::initialize_result()),
            "shutdown" => {
                tracing::info!("Shutdown requested");
                self.shutdown_requested = true;
                protocol::response(id, Value::Null)
            }
            _ => {
                tracing::debug!("Unsupported request {method}");
                protocol::error_response(
                    id,
                    METHOD_NOT_FOUND,
                    &format!("Method not found: {method}"),
                )
            }
        };
        self.reply(frame);
    }

    async fn on_notification(&mut self, method: &str, params: Value) {
        match method {
            "initialized" => tracing::info!("Editor initialized"),
            "textDocument/didOpen" => {
                if let Some(params) = parse::<DidOpenParams>(method, params) {
                    self.did_open(params).await;
                }
            }
            "textDocument/didChange" => {
                if let Some(params) = parse::<DidChangeParams>(method, params) {
                    self.did_change(params);
                }
            }
            "textDocument/didClose" => {
                if let Some(params) = parse::<DidCloseParams>(method, params) {
                    self.did_close(params).await;
                }
            }
            _ => tracing::trace!("Ignoring notification {method}"),
        }
    }

    async fn did_open(&mut self, params: DidOpenParams) {
        let item = params.text_document;
        let uri = item.uri;

        if let Some(doc) = self.documents.get_mut(&uri) {
            doc.cancel_debounce();
            doc.text = item.text;
            let syntax_changed = doc.syntax != item.language_id;
            doc.syntax = item.language_id;
            let (editor, document) = (doc.editor, doc.snapshot(&uri));
            let event = if syntax_changed {
                EditorEvent::SyntaxChanged { editor, document }
            } else {
                EditorEvent::StoppedChanging { editor, document }
            };
            self.emit(event).await;
            return;
        }

        self.next_editor += 1;
        let editor = EditorId::new(self.next_editor);
        let doc = OpenDocument {
            editor,
            syntax: item.language_id,
            text: item.text,
            debounce: None,
        };
        let document = doc.snapshot(&uri);
        self.documents.insert(uri, doc);
        self.emit(EditorEvent::EditorAdded { editor, document }).await;
    }

    fn did_change(&mut self, mut params: DidChangeParams) {
        let uri = params.text_document.uri;
        let Some(doc) = self.documents.get_mut(&uri) else {
            tracing::debug!(uri = %uri, "Change for a document that isn't open");
            return;
        };
        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.pop() else {
            return;
        };

        doc.text = change.text;
        doc.cancel_debounce();
        let event = EditorEvent::StoppedChanging {
            editor: doc.editor,
            document: doc.snapshot(&uri),
        };
        let events = self.events.clone();
        let delay = self.debounce;
        doc.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(event).await.is_err() {
                tracing::debug!("Coordinator stopped; dropping settled edit");
            }
        }));
    }

    async fn did_close(&mut self, params: DidCloseParams) {
        let uri = params.text_document.uri;
        let Some(mut doc) = self.documents.remove(&uri) else {
            tracing::debug!(uri = %uri, "Close for a document that isn't open");
            return;
        };
        doc.cancel_debounce();
        self.emit(EditorEvent::EditorDestroyed { editor: doc.editor })
            .await;
    }

    async fn emit(&self, event: EditorEvent) {
        if self.events.send(event).await.is_err() {
            tracing::warn!("Coordinator stopped; dropping editor event");
        }
    }

    fn close(&mut self) {
        for doc in self.documents.values_mut() {
            doc.cancel_debounce();
        }
    }
}

fn parse<T: DeserializeOwned>(method: &str, params: Value) -> Option<T> {
    match serde_json::from_value(params) {
        Ok(params) => Some(params),
        Err(e) => {
            tracing::warn!("Invalid {method} params: {e}");
            None
        }
    }
}

async fn write_frames<W: AsyncWrite + Unpin>(
    writer: W,
    mut commands: mpsc::UnboundedReceiver<WriterCommand>,
) {
    let mut writer = FrameWriter::new(writer);
    while let Some(command) = commands.recv().await {
        match command {
            WriterCommand::Send(frame) => {
                if let Err(e) = writer.write_frame(&frame).await {
                    tracing::warn!("Writing to editor: {e}");
                    break;
                }
            }
            WriterCommand::Shutdown => break,
        }
    }
}

/// Serve one editor over `reader`/`writer` until `exit` or end of input.
///
/// `config_path` is what "Help" on the runner notification opens.
pub async fn serve<R, W>(
    reader: R,
    writer: W,
    settings: LinterSettings,
    config_path: Option<PathBuf>,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_frames(writer, out_rx));
    let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

    let host = Arc::new(LspHost::new(out_tx.clone(), Arc::clone(&pending), config_path));
    let linter = JsonLint::start(settings.validator().clone(), host).await;
    let coordinator = Coordinator::new(linter).spawn();

    let mut session = Session {
        events: coordinator.sender(),
        out: out_tx.clone(),
        pending,
        documents: HashMap::new(),
        next_editor: 0,
        debounce: settings.debounce(),
        shutdown_requested: false,
    };
    let result = session.run(FrameReader::new(reader)).await;

    session.close();
    drop(session);
    coordinator.shutdown().await;
    let _ = out_tx.send(WriterCommand::Shutdown);
    if let Err(e) = writer_task.await {
        tracing::warn!("Writer task ended abnormally: {e}");
    }
    result
}
