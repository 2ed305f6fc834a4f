//! Editor-owned documents as seen by the linter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntax tag of documents that get linted.
pub const JSON_SYNTAX: &str = "json";

/// Stable identity of a document (e.g. `file:///home/me/package.json`).
///
/// Compared byte-for-byte. The editor owns the canonical form; we never
/// normalize it, so two editors showing the same buffer report the same URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentUri(String);

impl DocumentUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentUri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentUri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of one editor view. Several editors may show the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditorId(u64);

impl EditorId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor#{}", self.0)
    }
}

/// Snapshot of a document at the moment an editor event fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    uri: DocumentUri,
    syntax: String,
    text: String,
}

impl TextDocument {
    pub fn new(uri: impl Into<DocumentUri>, syntax: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            syntax: syntax.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &DocumentUri {
        &self.uri
    }

    /// Editor-assigned syntax tag (e.g. "json", "plaintext").
    #[must_use]
    pub fn syntax(&self) -> &str {
        &self.syntax
    }

    /// Full document text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}
