//! # Declarative Schema Configuration
//!
//! Per-schema behavior knobs, deserializable from YAML so deployments can
//! keep them next to other settings. Every field has a serde default, so an
//! empty document is a valid configuration.
//!
//! ```yaml
//! unknown: exclude
//! stream_chunk_size: 4096
//! pretty_json: false
//! enforce_json_schema: true
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How loading treats input keys that name no declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Report each unknown key as a field error.
    #[default]
    Raise,
    /// Drop unknown keys silently.
    Exclude,
    /// Pass unknown keys through unchanged.
    Include,
}

/// Configuration of a declarative schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarativeConfig {
    /// Unknown-key policy for `load` / `loads`.
    #[serde(default)]
    pub unknown: UnknownPolicy,
    /// Maximum bytes per chunk handed to a writer callback.
    #[serde(default = "default_stream_chunk_size")]
    pub stream_chunk_size: usize,
    /// Pretty-print JSON output.
    #[serde(default)]
    pub pretty_json: bool,
    /// Check JSON input against the generated JSON Schema before loading.
    #[serde(default)]
    pub enforce_json_schema: bool,
}

fn default_stream_chunk_size() -> usize {
    8192
}

impl Default for DeclarativeConfig {
    fn default() -> Self {
        Self {
            unknown: UnknownPolicy::default(),
            stream_chunk_size: default_stream_chunk_size(),
            pretty_json: false,
            enforce_json_schema: false,
        }
    }
}

/// Invalid declarative configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid YAML for this structure.
    #[error("failed to parse declarative config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Chunks must hold at least one byte.
    #[error("stream_chunk_size must be greater than zero")]
    InvalidChunkSize,
}

impl DeclarativeConfig {
    /// Parse and check a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no schema can operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }
}
