//! Configuration file support for package-size.
//!
//! Provides YAML-based configuration through `package-size.config.yml` files
//! and merges it with command-line overrides into [`Settings`].

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::outbound::network::{
    DEFAULT_API_URL, DEFAULT_REGISTRY_TIMEOUT, DEFAULT_REGISTRY_URL,
};
use crate::application::dto::OutputFormat;
use crate::application::services::{DEFAULT_IMAGE, DEFAULT_INSTALL_TIMEOUT};
use crate::application::use_cases::DEFAULT_RESOLVER_WORKERS;
use crate::shared::error::SizeError;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "package-size.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub image: Option<String>,
    pub npm_cache: Option<PathBuf>,
    pub no_cleanup: Option<bool>,
    pub stream_install_logs: Option<bool>,
    pub resolver_workers: Option<usize>,
    pub registry_url: Option<String>,
    pub api_url: Option<String>,
    pub registry_timeout_secs: Option<u64>,
    pub install_timeout_secs: Option<u64>,
    pub format: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    warn_unknown_fields(&config);
    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

/// Values given on the command line. `None` (or `false`) defers to the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub image: Option<String>,
    pub npm_cache: Option<PathBuf>,
    pub no_cleanup: bool,
    pub quiet_install: bool,
    pub resolver_workers: Option<usize>,
    pub registry_url: Option<String>,
    pub api_url: Option<String>,
    pub registry_timeout_secs: Option<u64>,
    pub install_timeout_secs: Option<u64>,
    pub format: Option<OutputFormat>,
}

/// Effective settings of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub image: String,
    pub npm_cache: Option<PathBuf>,
    pub no_cleanup: bool,
    pub stream_install_logs: bool,
    pub resolver_workers: usize,
    pub registry_url: String,
    pub api_url: String,
    pub registry_timeout: Duration,
    pub install_timeout: Duration,
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            npm_cache: None,
            no_cleanup: false,
            stream_install_logs: true,
            resolver_workers: DEFAULT_RESOLVER_WORKERS,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
            format: OutputFormat::default(),
        }
    }
}

impl Settings {
    /// Merges command-line overrides over the config file over defaults.
    ///
    /// # Errors
    /// [`SizeError::InvalidConfig`] for zero workers or timeouts and for an
    /// unknown format name.
    pub fn resolve(overrides: &Overrides, file: Option<ConfigFile>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Settings::default();

        let format = match (overrides.format, file.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => OutputFormat::from_str(name)
                .map_err(|message| SizeError::InvalidConfig { message })?,
            (None, None) => defaults.format,
        };

        let resolver_workers = positive(
            "resolver_workers",
            overrides.resolver_workers.or(file.resolver_workers),
        )?
        .unwrap_or(defaults.resolver_workers);

        let registry_timeout = positive(
            "registry_timeout_secs",
            overrides.registry_timeout_secs.or(file.registry_timeout_secs),
        )?
        .map(Duration::from_secs)
        .unwrap_or(defaults.registry_timeout);

        let install_timeout = positive(
            "install_timeout_secs",
            overrides.install_timeout_secs.or(file.install_timeout_secs),
        )?
        .map(Duration::from_secs)
        .unwrap_or(defaults.install_timeout);

        Ok(Settings {
            image: overrides
                .image
                .clone()
                .or(file.image)
                .unwrap_or(defaults.image),
            npm_cache: overrides.npm_cache.clone().or(file.npm_cache),
            no_cleanup: overrides.no_cleanup || file.no_cleanup.unwrap_or(defaults.no_cleanup),
            stream_install_logs: !overrides.quiet_install
                && file
                    .stream_install_logs
                    .unwrap_or(defaults.stream_install_logs),
            resolver_workers,
            registry_url: overrides
                .registry_url
                .clone()
                .or(file.registry_url)
                .unwrap_or(defaults.registry_url),
            api_url: overrides
                .api_url
                .clone()
                .or(file.api_url)
                .unwrap_or(defaults.api_url),
            registry_timeout,
            install_timeout,
            format,
        })
    }
}

fn positive<T>(key: &str, value: Option<T>) -> Result<Option<T>>
where
    T: PartialEq + Default,
{
    match value {
        Some(v) if v == T::default() => Err(SizeError::InvalidConfig {
            message: format!("{} must be greater than zero", key),
        }
        .into()),
        other => Ok(other),
    }
}
