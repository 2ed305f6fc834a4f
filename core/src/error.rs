//! Failure taxonomy for lint runs and host interaction.
//!
//! A validator that prints something we can't parse is not an error: it
//! yields an empty result set. See [`crate::parser`].

use std::io;

/// Failures inside the process adapter. Logged and swallowed at the
/// adapter boundary; never surfaced as a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("{program} not found in PATH")]
    ToolMissing { program: String },

    #[error("spawning {program}: {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("no {stream} from {program}")]
    MissingStream {
        program: String,
        stream: &'static str,
    },

    #[error("I/O with {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("installing {package} failed: {detail}")]
    Install { package: String, detail: String },
}

/// Failures reported by the editor host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("editor connection closed")]
    Disconnected,

    #[error("editor rejected request: {0}")]
    Rejected(String),
}
