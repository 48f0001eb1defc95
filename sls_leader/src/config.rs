//! Runtime configuration from environment variables with optional TOML
//! file overrides

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file {} is not valid TOML: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding per-host configuration cache files
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,

    /// Hard timeout for a single remote command, in seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Upper bound on hosts handled in parallel; 0 means one per CPU
    #[serde(default = "default_max_parallel_hosts")]
    pub max_parallel_hosts: usize,
}

fn default_cache_root() -> PathBuf {
    env::var("SLS_CACHE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/sls"))
}

fn default_command_timeout_secs() -> u64 {
    env::var("SLS_COMMAND_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30)
}

fn default_max_parallel_hosts() -> usize {
    env::var("SLS_MAX_PARALLEL_HOSTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            command_timeout_secs: default_command_timeout_secs(),
            max_parallel_hosts: default_max_parallel_hosts(),
        }
    }
}

impl RuntimeConfig {
    /// Environment defaults, overridden by the TOML file when given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
