//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or validating retrieval settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse retrieval config '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A setting is out of range.
    #[error("Invalid setting '{key}': {message}")]
    ValidationError { key: &'static str, message: String },
}
