//! Validator results and the diagnostics derived from them.

/// One issue reported by the external validator.
///
/// `column` is the validator's 0-indexed column; `line` is passed through
/// exactly as reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintResult {
    line: u32,
    column: u32,
    found: String,
    expected: String,
}

impl LintResult {
    #[must_use]
    pub fn new(line: u32, column: u32, found: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            line,
            column,
            found: found.into(),
            expected: expected.into(),
        }
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[must_use]
    pub fn found(&self) -> &str {
        &self.found
    }

    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

/// Severity level for a diagnostic.
///
/// The validator has no warning-level output, so `Error` is the only level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error = 1,
}

impl DiagnosticSeverity {
    /// LSP numeric severity (1=Error).
    #[must_use]
    pub fn to_lsp(self) -> u64 {
        self as u64
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

/// An editor-facing diagnostic.
///
/// Fields are private; the only construction path is [`LintDiagnostic::from_result`],
/// which keeps the message format and column conversion in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintDiagnostic {
    severity: DiagnosticSeverity,
    message: String,
    line: u32,
    /// 1-indexed column.
    column: u32,
}

impl LintDiagnostic {
    #[must_use]
    pub fn from_result(result: &LintResult) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            message: format!(
                "Found {}; Expected {}",
                quote(result.found()),
                result.expected()
            ),
            line: result.line(),
            column: result.column().saturating_add(1),
        }
    }

    #[must_use]
    pub fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Line as reported by the validator.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-indexed column.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }
}

/// Render a token as a JSON string literal.
fn quote(token: &str) -> String {
    serde_json::to_string(token).unwrap_or_else(|_| format!("\"{token}\""))
}
