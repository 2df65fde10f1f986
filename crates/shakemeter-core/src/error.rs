//! Core error types for shakemeter-core.
//!
//! This module defines the error hierarchy using thiserror. Sensor and
//! effect failures are recoverable at their boundaries; configuration
//! errors fail fast before a meter accepts any input.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for shakemeter-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sensor-related errors
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// The session task has already shut down
    #[error("Session closed")]
    SessionClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-separated configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Sensor errors.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The sampler could not be started
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    /// The sample stream ended while subscribed
    #[error("Sensor disconnected")]
    Disconnected,

    /// A recorded trace could not be read
    #[error("Invalid trace at line {line}: {message}")]
    Trace { line: usize, message: String },
}

/// Effect device errors.
///
/// Never escalated to `CoreError`: the feedback trigger absorbs them and
/// reports an `Event::EffectFailed` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// Device is busy and cannot accept the command right now
    #[error("Effect device busy")]
    Busy,

    /// Device resources were already released
    #[error("Effect device already released")]
    Released,

    /// Any other device failure
    #[error("Effect device failure: {0}")]
    Device(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
