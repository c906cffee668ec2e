use std::time::Duration;

use rdkafka::client::ClientContext;
use rdkafka::message::Message as RdkafkaMessage;
use rdkafka::producer::{BaseRecord, DeliveryResult, Producer, ProducerContext, ThreadedProducer};
use rdkafka::util::Timeout;
use tracing::{error, info};

use crate::config::ProducerConfig;
use crate::error::{PublishError, Result};

/// A message waiting to be handed to the broker.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingRecord<'a> {
    pub topic: &'a str,
    pub key: Option<&'a [u8]>,
    pub payload: &'a [u8],
}

impl<'a> OutgoingRecord<'a> {
    pub fn new(topic: &'a str, payload: &'a [u8]) -> Self {
        Self {
            topic,
            key: None,
            payload,
        }
    }

    pub fn with_key(mut self, key: &'a [u8]) -> Self {
        self.key = Some(key);
        self
    }
}

/// Destination for published messages.
///
/// `enqueue` only queues the message; `flush` blocks the calling thread until
/// everything queued so far is acknowledged or `timeout` passes.
pub trait MessageSink: Send + Sync {
    fn enqueue(&self, record: OutgoingRecord<'_>) -> Result<()>;

    fn flush(&self, timeout: Duration) -> Result<()>;
}

/// Producer context that reports each delivery outcome to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeliveryLogger;

impl ClientContext for DeliveryLogger {}

impl ProducerContext for DeliveryLogger {
    type DeliveryOpaque = ();

    fn delivery(&self, result: &DeliveryResult<'_>, _: Self::DeliveryOpaque) {
        match result {
            Ok(msg) => info!(
                "Delivered message to {} [{}] at offset {}",
                msg.topic(),
                msg.partition(),
                msg.offset()
            ),
            Err((e, msg)) => error!(
                "Delivery failed for message to {} [{}]: {e}",
                msg.topic(),
                msg.partition()
            ),
        }
    }
}

/// [`MessageSink`] backed by a librdkafka producer.
///
/// The producer polls for delivery reports on its own thread, so callbacks
/// fire whether or not anyone is waiting on `flush`.
pub struct RdkafkaSink {
    producer: ThreadedProducer<DeliveryLogger>,
}

impl RdkafkaSink {
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        let producer = config
            .client_config()
            .create_with_context(DeliveryLogger)
            .map_err(PublishError::Connect)?;
        info!("Kafka producer created for {}", config.broker.brokers);
        Ok(Self { producer })
    }
}

impl MessageSink for RdkafkaSink {
    fn enqueue(&self, record: OutgoingRecord<'_>) -> Result<()> {
        let mut base = BaseRecord::<[u8], [u8]>::to(record.topic).payload(record.payload);
        if let Some(key) = record.key {
            base = base.key(key);
        }
        self.producer
            .send(base)
            .map_err(|(source, _)| PublishError::Enqueue {
                topic: record.topic.to_string(),
                source,
            })
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(PublishError::Flush)
    }
}
