//! `jsonlint-ls`: a language server that lints JSON with `jsonlint`.
//!
//! Stdin/stdout carry the LSP session, so logs go to a file.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use jsonlint_config::{APP_DIR_NAME, JsonlintConfig};
use jsonlint_types::LinterSettings;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_NAME: &str = "jsonlint-ls.log";

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than write into the LSP stream.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!("Failed to create log dir {}: {e}", parent.display()));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!("Failed to open log file {}: {e}", candidate.display()));
            }
        }
    }

    (None, warnings)
}

/// `~/.jsonlint-ls/logs/jsonlint-ls.log`, then `./.jsonlint-ls/logs/jsonlint-ls.log`.
fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = jsonlint_config::app_dir() {
        candidates.push(dir.join("logs").join(LOG_FILE_NAME));
    }
    candidates.push(PathBuf::from(APP_DIR_NAME).join("logs").join(LOG_FILE_NAME));
    candidates
}

/// Settings from the config file, or defaults if it can't be used.
fn settings() -> Result<LinterSettings> {
    match jsonlint_config::load_settings() {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::warn!("{e}; continuing with defaults");
            JsonlintConfig::default()
                .resolve()
                .context("resolving default settings")
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let settings = settings()?;
    let validator = settings.validator();
    tracing::info!(
        runner = validator.runner(),
        package = validator.package(),
        install_dir = %validator.install_dir().display(),
        "Starting jsonlint-ls"
    );

    jsonlint_lsp::serve(
        tokio::io::stdin(),
        tokio::io::stdout(),
        settings,
        jsonlint_config::config_path(),
    )
    .await
    .context("LSP session failed")?;

    tracing::info!("jsonlint-ls stopped");
    Ok(())
}
