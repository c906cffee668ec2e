//! Error types for the publisher.

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors returned to callers of the publisher.
///
/// Per-message delivery failures are not among them; the sink logs those
/// from its delivery callback.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to create Kafka producer: {0}")]
    Connect(#[source] KafkaError),

    #[error("Failed to enqueue message for topic '{topic}': {source}")]
    Enqueue {
        topic: String,
        #[source]
        source: KafkaError,
    },

    #[error("Flush did not complete: {0}")]
    Flush(#[source] KafkaError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] kafka_types::KafkaTypesError),

    #[error("Flush task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PublishError>;
