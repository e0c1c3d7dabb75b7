//! Configuration management

pub mod store;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub use store::CredentialStore;

/// Production StrikeTracker endpoint
pub const DEFAULT_BASE_URL: &str = "https://striketracker.highwinds.com";

/// Credential cache file name in the home directory
pub const CACHE_FILENAME: &str = ".highwinds";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API base URL
    pub base_url: String,

    /// Credential cache location
    pub cache_file: PathBuf,

    /// Output format
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Compact,
}

impl OutputFormat {
    /// Parse a format name; unknown names fall back to YAML
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "compact" => OutputFormat::Compact,
            _ => OutputFormat::Yaml,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        let base_url =
            env::var("HIGHWINDS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let cache_file = match env::var_os("HIGHWINDS_CACHE_FILE") {
            Some(path) => PathBuf::from(path),
            None => Self::default_cache_file()?,
        };

        let output_format =
            OutputFormat::from_name(&env::var("HIGHWINDS_OUTPUT_FORMAT").unwrap_or_default());

        Ok(Self {
            base_url,
            cache_file,
            output_format,
        })
    }

    /// `~/.highwinds`
    pub fn default_cache_file() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        Ok(home.join(CACHE_FILENAME))
    }

    /// Apply the `--format` flag over the environment default
    pub fn with_format(mut self, format: Option<&str>) -> Self {
        if let Some(name) = format {
            self.output_format = OutputFormat::from_name(name);
        }
        self
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(&self.cache_file)
    }
}
