use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default values used by [`GatewayConfig`]
pub mod defaults {
    /// gateway listening on the local host
    pub const BASE_URL: &str = "http://127.0.0.1:8080";
    /// batch read endpoint
    pub const BATCH_READ_PATH: &str = "/device/batchRead";
    /// single-item command endpoint
    pub const EXECUTE_PATH: &str = "/device/execute";
    /// timeout of a batch read in milliseconds
    pub const TIMEOUT_MS: u64 = 10_000;
    /// timeout of a single-item command in milliseconds
    pub const COMMAND_TIMEOUT_MS: u64 = 5_000;
}

/// Errors that can occur while loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// the file could not be read
    #[error("unable to read {path}: {source}")]
    Io {
        /// path of the file
        path: String,
        /// underlying error
        source: std::io::Error,
    },
    /// the file is not valid JSON for a configuration
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        /// path of the file
        path: String,
        /// underlying error
        source: serde_json::Error,
    },
}

/// Location of the gateway and the timeouts used when talking to it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// scheme, host and port of the gateway, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    /// path of the batch read endpoint
    pub batch_read_path: String,
    /// path of the single-item command endpoint
    pub execute_path: String,
    /// bound on a single batch read round trip
    pub timeout_ms: u64,
    /// bound on a single command round trip
    pub command_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            batch_read_path: defaults::BATCH_READ_PATH.to_string(),
            execute_path: defaults::EXECUTE_PATH.to_string(),
            timeout_ms: defaults::TIMEOUT_MS,
            command_timeout_ms: defaults::COMMAND_TIMEOUT_MS,
        }
    }
}

impl GatewayConfig {
    /// default configuration pointing at another gateway
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// load a configuration from a JSON file, missing fields take their default
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// full URL of the batch read endpoint
    pub fn batch_read_url(&self) -> String {
        join(&self.base_url, &self.batch_read_path)
    }

    /// full URL of the command endpoint
    pub fn execute_url(&self) -> String {
        join(&self.base_url, &self.execute_path)
    }

    /// batch read timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// command timeout
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
