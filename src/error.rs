// src/error.rs
//! Error types shared by connectors, configuration and the pipeline.

use thiserror::Error;

/// Failure of one source during a fetch cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("fetch from `{source_type}` failed: {message}")]
pub struct FetchError {
    pub source_type: &'static str,
    pub message: String,
}

impl FetchError {
    pub fn new(source_type: &'static str, message: impl ToString) -> Self {
        Self {
            source_type,
            message: message.to_string(),
        }
    }
}

/// Failure of one channel while publishing a digest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("notify via `{channel_type}` failed: {message}")]
pub struct NotifyError {
    pub channel_type: &'static str,
    pub message: String,
}

impl NotifyError {
    pub fn new(channel_type: &'static str, message: impl ToString) -> Self {
        Self {
            channel_type,
            message: message.to_string(),
        }
    }
}

/// Raised at startup, before any connector runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config from {path}: {message}")]
    Read { path: String, message: String },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("missing env var {0}")]
    MissingEnv(&'static str),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
