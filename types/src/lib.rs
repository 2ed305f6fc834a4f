//! Core domain types for jsonlint-ls.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod diagnostic;
mod document;
mod settings;

pub use diagnostic::{DiagnosticSeverity, LintDiagnostic, LintResult};
pub use document::{DocumentUri, EditorId, JSON_SYNTAX, TextDocument};
pub use settings::{
    DEFAULT_DEBOUNCE_MS, LinterSettings, SettingsError, ValidatorSettings,
};
