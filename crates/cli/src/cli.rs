//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use doccache_core::{AppConfig, ConfigError};
use figment::Figment;

#[derive(Parser, Debug)]
#[command(name = "doccache", version, about = "Cache remote images under sharded paths")]
pub struct CliArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the maximum document size in megabytes
    #[arg(long, global = true)]
    pub max_size_mb: Option<u64>,

    /// Accept file:// URLs as sources
    #[arg(long, global = true)]
    pub allow_file_urls: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download URL into the cache and print its cache path
    Save {
        /// URL of the image to cache
        url: String,
    },
    /// Read a cached document by path
    Get {
        /// Path printed by `save`
        path: String,

        /// Write the content to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check whether a mime type is accepted by the cache
    CheckMime {
        /// Media type, e.g. image/png
        mime: String,
    },
}

impl CliArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(max_size_mb) = self.max_size_mb {
            config.max_size_mb = max_size_mb;
        }
        if self.allow_file_urls {
            config.allow_file_urls = true;
        }
    }

    /// Extract configuration from `figment`, apply overrides, then validate once.
    pub fn resolve_config(&self, figment: &Figment) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::extract(figment)?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}
