//! Uploader configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/beamdrop/config.toml`
//! - Windows: `%APPDATA%/beamdrop/config.toml`

use std::path::{Path, PathBuf};

use beamdrop_protocol::ExpirationUnit;
use beamdrop_protocol::constants::{CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the upload server.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Transfer attempts per file, first attempt included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Unit applied to `--expire` when `--unit` is not given.
    #[serde(default)]
    pub default_expiration_unit: ExpirationUnit,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://127.0.0.1:8787".into()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_connect_timeout_secs() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            max_attempts: default_max_attempts(),
            default_expiration_unit: ExpirationUnit::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, writing defaults there if absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("beamdrop")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("beamdrop").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/beamdrop/config.toml"))
    }
}
