use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] kafka_types::KafkaTypesError),

    #[error("Schema registry error: {0}")]
    Registry(#[from] kafkalib_schema_registry::RegistryError),
}

pub type Result<T> = std::result::Result<T, Error>;
