//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LTO_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: the service starts on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5731;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
pub const DEFAULT_ARCHIVE_NAME: &str = "landr_ordered_renamed_tracks.zip";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_CONFIG: &str = "LTO_CONFIG";
pub const ENV_HOST: &str = "LTO_HOST";
pub const ENV_PORT: &str = "LTO_PORT";
pub const ENV_MAX_UPLOAD_BYTES: &str = "LTO_MAX_UPLOAD_BYTES";
pub const ENV_ARCHIVE_NAME: &str = "LTO_ARCHIVE_NAME";
pub const ENV_LOG_LEVEL: &str = "LTO_LOG_LEVEL";

/// Contents of `config.toml`; every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    pub archive_name: Option<String>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse a config file; a malformed file is a [`Error::Config`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load from `explicit` if given, else from the platform default location
    ///
    /// An explicit path that does not exist is an error. A missing default
    /// file yields an empty config.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config file: {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                tracing::info!("No config file at {} (using defaults)", path.display());
                Ok(Self::default())
            }
            None => {
                tracing::warn!("Could not determine config directory (using defaults)");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file location: `<config_dir>/lto/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lto").join("config.toml"))
}

/// Settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    pub archive_name: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub archive_name: String,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Merge CLI, environment, TOML and defaults, then validate
    pub fn resolve(cli: &CliOverrides, file: &TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            host: pick(cli.host.clone(), env_value(ENV_HOST)?, file.host.clone())
                .unwrap_or(defaults.host),
            port: pick(cli.port, env_value(ENV_PORT)?, file.port).unwrap_or(defaults.port),
            max_upload_bytes: pick(
                cli.max_upload_bytes,
                env_value(ENV_MAX_UPLOAD_BYTES)?,
                file.max_upload_bytes,
            )
            .unwrap_or(defaults.max_upload_bytes),
            archive_name: pick(
                cli.archive_name.clone(),
                env_value(ENV_ARCHIVE_NAME)?,
                file.archive_name.clone(),
            )
            .unwrap_or(defaults.archive_name),
            log_level: pick(
                cli.log_level.clone(),
                env_value(ENV_LOG_LEVEL)?,
                file.log_level.clone(),
            )
            .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        let archive = self.archive_name.as_str();
        if archive.contains('/') || archive.contains('\\') {
            return Err(Error::Config(format!(
                "archive_name must be a bare filename: {}",
                archive
            )));
        }
        if !archive.to_ascii_lowercase().ends_with(".zip") || archive.len() <= ".zip".len() {
            return Err(Error::Config(format!(
                "archive_name must end in .zip: {}",
                archive
            )));
        }
        Ok(())
    }
}

fn pick<T>(cli: Option<T>, env: Option<T>, file: Option<T>) -> Option<T> {
    cli.or(env).or(file)
}

/// Read and parse an environment variable; unset or empty means `None`
fn env_value<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {} ({})", name, raw, e))),
        Err(_) => Ok(None),
    }
}
