//! Runtime configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its default.
//!
//! ```json
//! { "bus": { "verbose": false }, "coordinator": { "max_executives": 3 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub bus: BusConfig,
    pub tasks: TaskConfig,
    pub coordinator: CoordinatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Log a line per part / content key on every send.
    pub verbose: bool,

    /// Width of text previews in send logs.
    pub preview_chars: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            preview_chars: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Window used when building context-aware messages.
    pub context_messages: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            context_messages: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Upper bound on executives researched per company.
    pub max_executives: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { max_executives: 5 }
    }
}

impl ParleyConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
