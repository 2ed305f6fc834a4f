//! Resolved linter settings shared across crates.
//!
//! These types represent fully-validated, resolved configuration state.
//! Raw TOML deserialization structs (with `Option` fields) stay private in
//! `jsonlint-config`. The config loader resolves them into these types at
//! the parse boundary.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Quiet period after the last edit before a document counts as settled.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("validator package must not be empty")]
    EmptyPackage,
    #[error("runner command must not be empty")]
    EmptyRunner,
    #[error("installer command must not be empty")]
    EmptyInstaller,
    #[error("syntax tag must not be empty")]
    EmptySyntax,
}

/// Validated description of how to install and run the external validator.
///
/// Invariant: `package`, `runner`, `installer` and `syntax` are non-empty,
/// enforced by [`ValidatorSettings::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSettings {
    package: String,
    runner: String,
    installer: String,
    args: Vec<String>,
    install_dir: PathBuf,
    syntax: String,
}

impl ValidatorSettings {
    pub fn new(
        package: impl Into<String>,
        runner: impl Into<String>,
        installer: impl Into<String>,
        args: Vec<String>,
        install_dir: impl Into<PathBuf>,
        syntax: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        let package = package.into();
        let runner = runner.into();
        let installer = installer.into();
        let syntax = syntax.into();
        if package.trim().is_empty() {
            return Err(SettingsError::EmptyPackage);
        }
        if runner.trim().is_empty() {
            return Err(SettingsError::EmptyRunner);
        }
        if installer.trim().is_empty() {
            return Err(SettingsError::EmptyInstaller);
        }
        if syntax.trim().is_empty() {
            return Err(SettingsError::EmptySyntax);
        }
        Ok(Self {
            package,
            runner,
            installer,
            args,
            install_dir: install_dir.into(),
            syntax,
        })
    }

    /// Package name handed to the runner (e.g. "jsonlint").
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Package-runner executable probed on PATH (e.g. "npx").
    #[must_use]
    pub fn runner(&self) -> &str {
        &self.runner
    }

    /// Package-manager executable used for installation (e.g. "npm").
    #[must_use]
    pub fn installer(&self) -> &str {
        &self.installer
    }

    /// Validator arguments; the check-only flag by default.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Syntax tag of documents handed to the validator.
    #[must_use]
    pub fn syntax(&self) -> &str {
        &self.syntax
    }

    /// Where the installer drops the package's executable shim.
    #[must_use]
    pub fn installed_bin(&self) -> PathBuf {
        self.install_dir
            .join("node_modules")
            .join(".bin")
            .join(&self.package)
    }

    /// Arguments for the runner: package name followed by validator args.
    #[must_use]
    pub fn runner_args(&self) -> Vec<String> {
        std::iter::once(self.package.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Arguments for the installer.
    #[must_use]
    pub fn install_args(&self) -> Vec<String> {
        vec![
            "install".to_string(),
            "--no-save".to_string(),
            "--prefix".to_string(),
            self.install_dir.display().to_string(),
            self.package.clone(),
        ]
    }
}

/// Everything the linter and its editor frontend need at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinterSettings {
    validator: ValidatorSettings,
    debounce: Duration,
}

impl LinterSettings {
    #[must_use]
    pub fn new(validator: ValidatorSettings, debounce: Duration) -> Self {
        Self {
            validator,
            debounce,
        }
    }

    #[must_use]
    pub fn validator(&self) -> &ValidatorSettings {
        &self.validator
    }

    /// Quiet period before an edited document is re-linted.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}
