//! Application configuration loaded from `config.toml` and `PULVER_*`
//! environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use ::config::{Config, Environment, File};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{FileStorage, DEFAULT_STORAGE_KEY};

/// Directory under the user's config directory holding `config.toml`.
pub const CONFIG_DIR: &str = "pulver-rechner";

const ENV_PREFIX: &str = "PULVER";

/// Runtime settings for the calculator frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory the settings record is stored in.
    pub storage_root: PathBuf,
    /// Key the settings record is stored under.
    pub storage_key: String,
    /// Quiet period before a text edit is committed.
    pub debounce_ms: u64,
    /// Directory receiving `pulver.log`.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: FileStorage::default_root(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            debounce_ms: 300,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// Load from the default config file plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (optional) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default(
                "storage_root",
                defaults.storage_root.to_string_lossy().into_owned(),
            )?
            .set_default("storage_key", defaults.storage_key)?
            .set_default("debounce_ms", defaults.debounce_ms as i64)?
            .set_default("log_dir", defaults.log_dir.to_string_lossy().into_owned())?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// Debounce delay as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).context("failed to serialize configuration")?;
        Ok(format!("# Pulver-Rechner configuration\n{body}"))
    }
}

/// Location of `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write a config file with default values unless one already exists.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(config_path())
}

/// Write a default config file at `path` unless one already exists.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    write_config(path, &AppConfig::default())?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}

/// Write `config` to `path` as TOML, creating parent directories.
pub fn write_config(path: impl AsRef<Path>, config: &AppConfig) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, config.to_toml()?)
        .with_context(|| format!("failed to write {}", path.display()))
}
