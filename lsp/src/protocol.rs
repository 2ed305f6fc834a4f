//! The slice of the LSP wire format this server speaks.

use std::path::{Path, PathBuf};

use jsonlint_core::NotificationRequest;
use jsonlint_types::{DocumentUri, LintDiagnostic};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub(crate) const METHOD_NOT_FOUND: i64 = -32601;
/// Sent for requests that arrive after `shutdown`.
pub(crate) const INVALID_REQUEST: i64 = -32600;

/// `TextDocumentSyncKind.Full`.
const SYNC_FULL: u8 = 1;
const DIAGNOSTIC_SOURCE: &str = "jsonlint";

#[derive(Debug, thiserror::Error)]
#[error("cannot convert path to file URI: {}", path.display())]
pub struct PathToUriError {
    path: PathBuf,
}

#[derive(Debug, Serialize)]
pub(crate) struct Request {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl Request {
    pub fn new(id: u64, method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl Notification {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

pub(crate) fn response(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub(crate) fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// One frame from the editor, classified.
#[derive(Debug, PartialEq)]
pub(crate) enum Incoming {
    Request { id: Value, method: String },
    Notification {
        method: String,
        params: Value,
    },
    /// Reply to a request we sent. Only numeric ids are ours.
    Response { id: u64, body: Value },
}

pub(crate) fn classify(frame: &Value) -> Option<Incoming> {
    let id = frame.get("id");
    let method = frame.get("method").and_then(Value::as_str).map(String::from);
    let is_reply = frame.get("result").is_some() || frame.get("error").is_some();

    match (id, method) {
        (Some(id), Some(method)) => Some(Incoming::Request {
            id: id.clone(),
            method,
        }),
        (None, Some(method)) => Some(Incoming::Notification {
            method,
            params: frame.get("params").cloned().unwrap_or(Value::Null),
        }),
        (Some(id), None) if is_reply => Some(Incoming::Response {
            id: id.as_u64()?,
            body: frame.clone(),
        }),
        _ => None,
    }
}

pub(crate) fn initialize_result() -> Value {
    json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": SYNC_FULL
            }
        },
        "serverInfo": {
            "name": "jsonlint-ls",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidOpenParams {
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDocumentItem {
    pub uri: DocumentUri,
    pub language_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidChangeParams {
    pub text_document: TextDocumentIdentifier,
    pub content_changes: Vec<ContentChange>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentChange {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidCloseParams {
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextDocumentIdentifier {
    pub uri: DocumentUri,
}

/// `textDocument/publishDiagnostics` params. Lines and columns go from the
/// validator's 1-based numbering to LSP's 0-based positions.
pub(crate) fn publish_diagnostics_params(uri: &DocumentUri, issues: &[LintDiagnostic]) -> Value {
    let diagnostics: Vec<Value> = issues
        .iter()
        .map(|issue| {
            let line = issue.line().saturating_sub(1);
            let character = issue.column().saturating_sub(1);
            json!({
                "range": {
                    "start": { "line": line, "character": character },
                    "end": { "line": line, "character": character.saturating_add(1) }
                },
                "severity": issue.severity().to_lsp(),
                "source": DIAGNOSTIC_SOURCE,
                "message": issue.message()
            })
        })
        .collect();
    json!({ "uri": uri, "diagnostics": diagnostics })
}

/// `MessageType.Error`.
const MESSAGE_TYPE_ERROR: u8 = 1;

pub(crate) fn show_message_request_params(request: &NotificationRequest) -> Value {
    let actions: Vec<Value> = request
        .actions()
        .iter()
        .map(|title| json!({ "title": title }))
        .collect();
    json!({
        "type": MESSAGE_TYPE_ERROR,
        "message": format!("{}: {}", request.title(), request.body()),
        "actions": actions
    })
}

/// Index of the action the user picked, from a `showMessageRequest` reply.
///
/// `null` (dismissed) and titles we never offered map to `None`.
pub(crate) fn chosen_action(request: &NotificationRequest, reply: &Value) -> Option<usize> {
    let title = reply.get("result")?.get("title")?.as_str()?;
    request.actions().iter().position(|action| action == title)
}

pub(crate) fn show_document_params(uri: &url::Url) -> Value {
    json!({ "uri": uri.as_str(), "external": false, "takeFocus": true })
}

pub fn path_to_file_uri(path: &Path) -> Result<url::Url, PathToUriError> {
    url::Url::from_file_path(path).map_err(|()| PathToUriError {
        path: path.to_path_buf(),
    })
}
