//! Validator installation into a private prefix.

use std::process::Stdio;

use jsonlint_types::ValidatorSettings;
use tokio::process::Command;

use crate::error::LintError;
use crate::probe;

/// Where the validator package stands.
///
/// `NotInstalled -> Installing -> Ready`, or `Failed` if the install step
/// errored. Lint runs never wait on this; a run against a missing package
/// simply fails and is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotInstalled,
    Installing,
    Ready,
    Failed,
}

pub(crate) async fn is_installed(settings: &ValidatorSettings) -> bool {
    tokio::fs::try_exists(settings.installed_bin())
        .await
        .unwrap_or(false)
}

/// `<installer> install --no-save --prefix <dir> <package>`.
pub(crate) async fn install(settings: &ValidatorSettings) -> Result<(), LintError> {
    let installer = probe::resolve(settings.installer())
        .await
        .ok_or_else(|| LintError::ToolMissing {
            program: settings.installer().to_string(),
        })?;

    tokio::fs::create_dir_all(settings.install_dir())
        .await
        .map_err(|source| LintError::Io {
            program: settings.installer().to_string(),
            source,
        })?;

    let output = Command::new(&installer)
        .args(settings.install_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| LintError::ProcessStart {
            program: settings.installer().to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = match stderr.trim() {
        "" => format!("{} exited with {}", settings.installer(), output.status),
        text => text.lines().last().unwrap_or(text).to_string(),
    };
    Err(LintError::Install {
        package: settings.package().to_string(),
        detail,
    })
}
