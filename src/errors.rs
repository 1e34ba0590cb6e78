// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CycledagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown mode '{0}' (expected one of: cycled, forecast-only, replay, omf, ens-regrid)")]
    UnknownMode(String),

    #[error("Missing required key '{key}' in {scope}")]
    MissingKey { scope: String, key: String },

    #[error("Invalid value for '{key}': '{value}' (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Task '{task}' references unknown task or metatask '{reference}'")]
    UnknownReference { task: String, reference: String },

    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    #[error("Invalid fan-out for task '{task}': {reason}")]
    InvalidFanOut { task: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CycledagError {
    pub(crate) fn missing(scope: impl Into<String>, key: impl Into<String>) -> Self {
        CycledagError::MissingKey {
            scope: scope.into(),
            key: key.into(),
        }
    }

    pub(crate) fn invalid(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        CycledagError::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CycledagError>;
