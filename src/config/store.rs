//! Local credential cache
//!
//! A flat YAML mapping persisted at a per-user path. The file is loaded
//! lazily on first access and rewritten in full on every `set`. There is no
//! locking: concurrent writers race and the last one wins.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde_yaml::Value as YamlValue;
use thiserror::Error;
use tracing::debug;

use crate::api::types::BearerToken;

/// Key under which the API token is cached
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read credentials from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to write credentials to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode credentials: {0}")]
    Encode(#[from] serde_yaml::Error),
}

/// Key-value store backed by a single YAML file
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    cache: Option<BTreeMap<String, String>>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    /// Load the backing file, replacing anything held in memory
    pub fn read(&mut self) -> Result<&BTreeMap<String, String>, StoreError> {
        let mut contents = String::new();
        open_private(&self.path, false)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;

        let map = if contents.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_yaml::from_str::<Option<BTreeMap<String, YamlValue>>>(&contents)
                .and_then(|doc| scalar_entries(doc.unwrap_or_default()))
                .map_err(|source| StoreError::Parse {
                    path: self.path.clone(),
                    source,
                })?
        };
        debug!("Loaded {} cached entries from {:?}", map.len(), self.path);

        Ok(self.cache.insert(map))
    }

    fn loaded(&mut self) -> Result<&mut BTreeMap<String, String>, StoreError> {
        if self.cache.is_none() {
            self.read()?;
        }
        Ok(self.cache.get_or_insert_with(BTreeMap::new))
    }

    /// Value under `key`, or `default` when absent
    pub fn get(&mut self, key: &str, default: Option<&str>) -> Result<Option<String>, StoreError> {
        let cache = self.loaded()?;
        Ok(cache
            .get(key)
            .cloned()
            .or_else(|| default.map(|d| d.to_string())))
    }

    /// Store `value` under `key` and rewrite the whole file
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path.clone();
        let cache = self.loaded()?;
        cache.insert(key.to_string(), value.to_string());

        let document = serde_yaml::to_string(cache)?;
        open_private(&path, true)
            .and_then(|mut f| f.write_all(document.as_bytes()))
            .map_err(|source| StoreError::Write { path, source })?;

        debug!("Saved {} to {:?}", key, self.path);
        Ok(())
    }

    /// Cached API token, if any
    pub fn token(&mut self) -> Result<Option<BearerToken>, StoreError> {
        Ok(self.get(TOKEN_KEY, None)?.map(BearerToken::new))
    }

    pub fn set_token(&mut self, token: &BearerToken) -> Result<(), StoreError> {
        self.set(TOKEN_KEY, token.as_str())
    }
}

/// Flatten a loaded document to strings; null entries count as absent
fn scalar_entries(
    doc: BTreeMap<String, YamlValue>,
) -> Result<BTreeMap<String, String>, serde_yaml::Error> {
    let mut map = BTreeMap::new();
    for (key, value) in doc {
        let value = match value {
            YamlValue::Null => continue,
            YamlValue::String(s) => s,
            YamlValue::Bool(b) => b.to_string(),
            YamlValue::Number(n) => n.to_string(),
            _ => {
                return Err(serde::de::Error::custom(format!(
                    "value of `{}` is not a scalar",
                    key
                )))
            }
        };
        map.insert(key, value);
    }
    Ok(map)
}

/// Open (creating if needed) with owner-only permissions
fn open_private(path: &Path, truncate: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.read(true).append(true);
    }
    options.create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}
