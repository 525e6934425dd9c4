// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: TOML file, then environment overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use kvs_storage::DEFAULT_QUEUE_CAPACITY;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "KVS_BIND_ADDR";
pub const ENV_TRANSACTION_LOG: &str = "KVS_TRANSACTION_LOG";
pub const ENV_LOG_PATH: &str = "KVS_LOG_PATH";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },
}

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// Daemon log file; stderr when unset
    pub log_path: Option<PathBuf>,
    /// Events a writer may queue before it waits on the committer
    pub queue_capacity: usize,
    pub backend: Backend,
}

/// Where the transaction log lives
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
    File {
        path: PathBuf,
    },
    Postgres {
        host: String,
        database: String,
        user: String,
        password: String,
        #[serde(default = "default_pg_port")]
        port: u16,
    },
}

fn default_pg_port() -> u16 {
    5432
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4000)),
            log_path: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            backend: Backend::File {
                path: default_transaction_log(),
            },
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.queue_capacity == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "queue_capacity",
                value: "0".to_string(),
            });
        }
        Ok(config)
    }

    /// Apply `KVS_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = value.parse().map_err(|_| ConfigError::InvalidSetting {
                name: ENV_BIND_ADDR,
                value,
            })?;
        }

        if let Some(value) = lookup(ENV_TRANSACTION_LOG) {
            if value.is_empty() {
                return Err(ConfigError::InvalidSetting {
                    name: ENV_TRANSACTION_LOG,
                    value,
                });
            }
            self.backend = Backend::File {
                path: PathBuf::from(value),
            };
        }

        if let Some(value) = lookup(ENV_LOG_PATH) {
            self.log_path = (!value.is_empty()).then(|| PathBuf::from(value));
        }

        Ok(())
    }
}

/// `<data dir>/kvs/transactions.log`, or the working directory if unknown
pub fn default_transaction_log() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("kvs").join("transactions.log"),
        None => PathBuf::from("transactions.log"),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
