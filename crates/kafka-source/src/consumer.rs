use async_trait::async_trait;
use kafka_types::Message;
use rdkafka::consumer::{Consumer as RdkafkaConsumer, StreamConsumer as RdkafkaStreamConsumer};
use rdkafka::message::{BorrowedMessage as RdkafkaBorrowedMessage, Message as RdkafkaMessage};
use tracing::info;

use crate::config::ConsumerConfig;
use crate::error::{Error, Result};
use crate::source::RecordSource;

/// Kafka consumer subscribed to a single topic.
///
/// Offsets are committed in the background by the client at
/// `auto_commit_interval_ms`; reconnection after broker errors is left to the
/// client as well.
pub struct KafkaConsumer {
    consumer: RdkafkaStreamConsumer,
    config: ConsumerConfig,
}

impl KafkaConsumer {
    /// Create a consumer and subscribe it to the configured topic.
    pub fn new(config: ConsumerConfig) -> Result<Self> {
        if config.topic.is_empty() {
            return Err(Error::Consumer("No topic configured".to_string()));
        }

        info!("Creating consumer");
        let consumer: RdkafkaStreamConsumer = config.client_config().create()?;
        info!(
            "Consumer created: brokers={}, group={}",
            config.broker.brokers, config.group_id
        );

        consumer.subscribe(&[&config.topic])?;
        info!("Subscribed to topic {}", config.topic);

        Ok(Self { consumer, config })
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &RdkafkaStreamConsumer {
        &self.consumer
    }
}

#[async_trait]
impl RecordSource for KafkaConsumer {
    async fn recv(&self) -> Result<Option<Message>> {
        let msg = self.consumer.recv().await?;
        Ok(Some(to_message(&msg)))
    }
}

fn to_message(msg: &RdkafkaBorrowedMessage) -> Message {
    let mut message = Message::new(
        msg.topic(),
        msg.partition(),
        msg.offset(),
        msg.payload().map(|p| p.to_vec()).unwrap_or_default(),
    );
    message.key = msg.key().map(|k| k.to_vec());
    message.timestamp = msg.timestamp().to_millis();
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_topic_is_rejected() {
        let err = KafkaConsumer::new(ConsumerConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Consumer(_)));
    }

    #[test]
    fn test_client_creation_failure_is_kafka_error() {
        let config = ConsumerConfig {
            auto_offset_reset: "sometimes".to_string(),
            ..ConsumerConfig::new("events")
        };
        let err = KafkaConsumer::new(config).err().unwrap();
        assert!(matches!(err, Error::Kafka(_)), "{err}");
    }
}
