//! Error types for logstore
//!
//! This module defines all error types used by the SQLite record sink, its
//! configuration layer and the tracing glue.

use thiserror::Error;

/// Main error type for logstore operations
#[derive(Error, Debug)]
pub enum LogStoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileMissing(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Initialization errors
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// I/O errors
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },

    /// Schema creation, insert and commit failures
    #[error("Database error: {source}")]
    DatabaseError {
        #[from]
        source: rusqlite::Error,
    },

    /// The sink has already been shut down
    #[error("Sink is closed")]
    SinkClosed,

}

/// Result type alias for logstore operations
pub type Result<T> = std::result::Result<T, LogStoreError>;

impl LogStoreError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new initialization error
    pub fn initialization<S: Into<String>>(msg: S) -> Self {
        Self::InitializationError(msg.into())
    }


    /// Get the error category for logging purposes
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigError(_) | Self::ConfigFileMissing(_) | Self::InvalidLogLevel(_) => {
                "config"
            }
            Self::InitializationError(_) => "initialization",
            Self::IoError { .. } => "io",
            Self::SerializationError { .. } => "serialization",
            Self::TomlError { .. } => "toml",
            Self::DatabaseError { .. } => "database",
            Self::SinkClosed => "sink",
        }
    }
}
