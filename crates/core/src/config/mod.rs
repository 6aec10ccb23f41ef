//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOCCACHE_*)
//! 2. TOML config file (if DOCCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Bytes per megabyte for the size ceiling.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Storage backend for cached documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Folders and files on the local filesystem under `cache_dir`.
    #[default]
    Fs,
    /// Embedded SQLite database at `db_path`.
    Sqlite,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOCCACHE_*)
/// 2. TOML config file (if DOCCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Maximum size of a cached document, in megabytes.
    ///
    /// Set via DOCCACHE_MAX_SIZE_MB environment variable.
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,

    /// Which store holds cached documents.
    ///
    /// Set via DOCCACHE_BACKEND environment variable (`fs` or `sqlite`).
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory of the filesystem store.
    ///
    /// Set via DOCCACHE_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Path to the SQLite store.
    ///
    /// Set via DOCCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via DOCCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fetch deadline in milliseconds.
    ///
    /// Set via DOCCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    ///
    /// Set via DOCCACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Whether `file://` URLs may be cached.
    ///
    /// Set via DOCCACHE_ALLOW_FILE_URLS environment variable.
    #[serde(default)]
    pub allow_file_urls: bool,
}

fn default_max_size_mb() -> u64 {
    10
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./doccache")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./doccache.sqlite")
}

fn default_user_agent() -> String {
    "doccache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            backend: StoreBackend::default(),
            cache_dir: default_cache_dir(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            allow_file_urls: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Size ceiling in bytes (`max_size_mb` * 1 MiB).
    pub fn max_size_bytes(&self) -> usize {
        usize::try_from(self.max_size_mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOCCACHE_`
    /// 2. TOML file from `DOCCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// The layered sources `load` reads from, without extracting them.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DOCCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("DOCCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Extract a configuration from a prepared figment and validate it.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config = Self::extract(figment)?;

        config.validate()?;

        Ok(config)
    }

    /// Extract a configuration without validating it.
    ///
    /// Callers that layer further overrides on top must call `validate` afterwards.
    pub fn extract(figment: &Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))
    }
}
