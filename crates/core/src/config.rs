//! Configuration injected into the store, paginator and binary.

use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 3000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk size must be positive")]
    ZeroChunkSize,

    #[error("invalid chunk size {0:?}")]
    InvalidChunkSize(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root holding `books/` and `users/`.
    pub data_dir: PathBuf,
    /// Characters per page, fixed for a deployment.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            chunk_size,
        }
    }

    /// Defaults overridden by `FOLIO_DATA_DIR` and `FOLIO_CHUNK_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(dir) = lookup("FOLIO_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(raw) = lookup("FOLIO_CHUNK_SIZE") {
            config.chunk_size = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidChunkSize(raw.clone()))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(())
    }

    pub fn books_dir(&self) -> PathBuf {
        self.data_dir.join("books")
    }

    pub fn users_dir(&self) -> PathBuf {
        self.data_dir.join("users")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("folio.log")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "folio", "folio")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}
