//! Error types for kafka-types crate.

use thiserror::Error;

/// Errors that can occur while handling Kafka record payloads.
#[derive(Error, Debug)]
pub enum KafkaTypesError {
    #[error("Payload too short for schema registry framing: {len} bytes")]
    PayloadTooShort { len: usize },

    #[error("Unexpected framing marker byte: {0:#04x}")]
    UnexpectedMarker(u8),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Failed to load environment file {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Result type alias for kafka-types operations.
pub type Result<T> = std::result::Result<T, KafkaTypesError>;
