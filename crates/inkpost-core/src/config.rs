//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/inkpost/config.toml)
//! 3. Environment variables (INKPOST_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "INKPOST";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Identifier allocation attempts per article before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Maximum number of tags per article
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,

    /// Hard ceiling on `offset + limit` for listings
    #[serde(default = "default_max_page_depth")]
    pub max_page_depth: usize,

    /// Keys per batched point read
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How long SQLite waits on a locked database before timing out
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_attempts: default_max_attempts(),
            max_tags: default_max_tags(),
            max_page_depth: default_max_page_depth(),
            batch_size: default_batch_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (INKPOST_DATA_DIR, INKPOST_BATCH_SIZE, INKPOST_BUSY_TIMEOUT_MS)
    /// 2. Config file (~/.config/inkpost/config.toml or INKPOST_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // INKPOST_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // INKPOST_BATCH_SIZE
        if let Ok(val) = std::env::var(format!("{}_BATCH_SIZE", ENV_PREFIX)) {
            self.batch_size = val
                .parse()
                .with_context(|| format!("Invalid {}_BATCH_SIZE: {}", ENV_PREFIX, val))?;
        }

        // INKPOST_BUSY_TIMEOUT_MS
        if let Ok(val) = std::env::var(format!("{}_BUSY_TIMEOUT_MS", ENV_PREFIX)) {
            self.busy_timeout_ms = val
                .parse()
                .with_context(|| format!("Invalid {}_BUSY_TIMEOUT_MS: {}", ENV_PREFIX, val))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with INKPOST_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inkpost")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("inkpost.db")
    }

    /// Limits enforced by the writer and the query engine
    pub fn limits(&self) -> Limits {
        Limits {
            max_attempts: self.max_attempts.max(1),
            max_tags: self.max_tags,
            max_page_depth: self.max_page_depth,
        }
    }
}

/// Limits consumed by the core components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Identifier allocation attempts per create
    pub max_attempts: u32,
    /// Tags per article
    pub max_tags: usize,
    /// Ceiling on `offset + limit`
    pub max_page_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Config::default().limits()
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inkpost")
}

fn default_max_attempts() -> u32 {
    5
}

fn default_max_tags() -> usize {
    5
}

fn default_max_page_depth() -> usize {
    1000
}

fn default_batch_size() -> usize {
    100
}

fn default_busy_timeout_ms() -> u64 {
    5000
}
