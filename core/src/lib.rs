//! JSON linting through an external validator.
//!
//! The pieces, leaves first:
//!
//! - [`parser`]: pulls a [`LintResult`](jsonlint_types::LintResult) out of validator output
//! - [`Reporter`]: owns the per-URI diagnostic set and mirrors it to the host
//! - [`JsonLint`]: runs the validator process (install, runner probe, spawn, capture)
//! - [`Coordinator`]: turns editor events into lint runs and clears
//!
//! Nothing in here propagates failures to the host. Every error is logged where
//! it is caught and the editor keeps running.

pub mod parser;

mod coordinator;
mod diagnostics;
mod error;
mod host;
mod install;
mod linter;
mod probe;
mod process;
mod reporter;

pub use coordinator::{Coordinator, CoordinatorHandle, EditorEvent};
pub use diagnostics::{DiagnosticsSnapshot, DiagnosticsStore};
pub use error::{HostError, LintError};
pub use host::{BoxFut, EditorHost, NotificationRequest, NotificationResponse};
pub use install::InstallState;
pub use linter::{HELP_ACTION, JsonLint, RUNNER_NOT_FOUND_ID};
pub use probe::{PathProbe, WhichProbe};
pub use process::{ValidatorCommand, ValidatorRun, run_validator};
pub use reporter::{LintTicket, Reporter};
