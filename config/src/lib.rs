//! Configuration loading for jsonlint-ls.
//!
//! The config file is optional. When present it is TOML:
//!
//! ```toml
//! [validator]
//! package = "jsonlint"
//! runner = "npx"
//! installer = "npm"
//! args = ["-c"]
//! install_dir = "${HOME}/.jsonlint-ls/validator"
//! syntax = "json"
//!
//! [editor]
//! debounce_ms = 300
//! ```
//!
//! Raw structs keep every field optional; [`JsonlintConfig::resolve`] fills
//! defaults and validates into [`LinterSettings`].

use serde::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use jsonlint_types::{DEFAULT_DEBOUNCE_MS, JSON_SYNTAX, LinterSettings, SettingsError, ValidatorSettings};

/// Environment variable that points at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "JSONLINT_LS_CONFIG";

/// Directory under the home directory holding config, logs and the validator.
pub const APP_DIR_NAME: &str = ".jsonlint-ls";
const CONFIG_FILE_NAME: &str = "config.toml";
const VALIDATOR_DIR_NAME: &str = "validator";

#[derive(Debug, Default, Deserialize)]
pub struct JsonlintConfig {
    pub validator: Option<ValidatorConfig>,
    pub editor: Option<EditorConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidatorConfig {
    /// npm package providing the validator. Default: "jsonlint".
    pub package: Option<String>,
    /// Package runner probed on PATH. Default: "npx".
    pub runner: Option<String>,
    /// Package manager used to install the validator. Default: "npm".
    pub installer: Option<String>,
    /// Validator arguments. Default: `["-c"]`.
    pub args: Option<Vec<String>>,
    /// Install prefix; `~` and `${VAR}` are expanded.
    pub install_dir: Option<String>,
    /// Syntax tag of linted documents. Default: "json".
    pub syntax: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditorConfig {
    /// Quiet period after an edit before re-linting.
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid settings in {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: SettingsError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }
}

impl JsonlintConfig {
    /// Load the config file from [`config_path`].
    ///
    /// Returns `Ok(None)` when no home directory is known or the file does
    /// not exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}; using defaults", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(Some(config))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Fill defaults and validate.
    pub fn resolve(&self) -> Result<LinterSettings, SettingsError> {
        let raw = self.validator.as_ref();
        let pick = |value: Option<&String>, default: &str| {
            value.cloned().unwrap_or_else(|| default.to_string())
        };

        let install_dir = raw
            .and_then(|v| v.install_dir.as_deref())
            .map_or_else(default_install_dir, expand_path);

        let validator = ValidatorSettings::new(
            pick(raw.and_then(|v| v.package.as_ref()), "jsonlint"),
            pick(raw.and_then(|v| v.runner.as_ref()), "npx"),
            pick(raw.and_then(|v| v.installer.as_ref()), "npm"),
            raw.and_then(|v| v.args.clone())
                .unwrap_or_else(|| vec!["-c".to_string()]),
            install_dir,
            pick(raw.and_then(|v| v.syntax.as_ref()), JSON_SYNTAX),
        )?;

        let debounce_ms = self
            .editor
            .as_ref()
            .and_then(|e| e.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        Ok(LinterSettings::new(
            validator,
            Duration::from_millis(debounce_ms),
        ))
    }
}

/// Load and resolve settings in one step. A missing file yields defaults.
pub fn load_settings() -> Result<LinterSettings, ConfigError> {
    let Some(path) = config_path() else {
        tracing::debug!("No home directory; using default settings");
        return JsonlintConfig::default()
            .resolve()
            .map_err(|source| ConfigError::Invalid {
                path: PathBuf::new(),
                source,
            });
    };

    let config = JsonlintConfig::load_from(&path)?.unwrap_or_default();
    config
        .resolve()
        .map_err(|source| ConfigError::Invalid { path, source })
}

/// `~/.jsonlint-ls`, the home of config, logs and the installed validator.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR_NAME))
}

/// Config file path: `$JSONLINT_LS_CONFIG` if set, else `~/.jsonlint-ls/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(value) = env::var(CONFIG_PATH_ENV)
        && !value.trim().is_empty()
    {
        return Some(expand_path(&value));
    }
    app_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Default validator install prefix.
///
/// Falls back to `./.jsonlint-ls/validator` when no home directory is known.
pub fn default_install_dir() -> PathBuf {
    app_dir()
        .unwrap_or_else(|| PathBuf::from(APP_DIR_NAME))
        .join(VALIDATOR_DIR_NAME)
}

/// Expand `${VAR}` references and a leading `~`.
pub fn expand_path(value: &str) -> PathBuf {
    let expanded = expand_env_vars(value);
    if let Some(rest) = expanded.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if expanded == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(expanded)
}

/// Replace `${VAR}` with the variable's value (empty when unset).
///
/// An unterminated `${` is kept literally.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            match env::var(var) {
                Ok(val) => out.push_str(&val),
                Err(_) => tracing::warn!("Config references unset variable ${{{var}}}"),
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
