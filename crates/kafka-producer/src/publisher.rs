use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::ProducerConfig;
use crate::error::Result;
use crate::sink::{MessageSink, OutgoingRecord, RdkafkaSink};

type Connector = Box<dyn Fn(&ProducerConfig) -> Result<Arc<dyn MessageSink>> + Send + Sync>;

/// Publishes messages through a single lazily created producer.
///
/// The sink is created on the first publish and shared by every later call,
/// including concurrent ones. Each publish flushes before returning, bounded
/// by [`ProducerConfig::flush_timeout`].
pub struct Publisher {
    config: ProducerConfig,
    sink: OnceCell<Arc<dyn MessageSink>>,
    connector: Connector,
}

impl Publisher {
    pub fn new(config: ProducerConfig) -> Self {
        Self::with_connector(config, |config| {
            let sink: Arc<dyn MessageSink> = Arc::new(RdkafkaSink::new(config)?);
            Ok(sink)
        })
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ProducerConfig::from_env()?))
    }

    /// Publish through an existing sink instead of connecting to a broker.
    pub fn with_sink(config: ProducerConfig, sink: Arc<dyn MessageSink>) -> Self {
        Self::with_connector(config, move |_| Ok(Arc::clone(&sink)))
    }

    /// Use `connector` to create the sink on first publish. A failed attempt
    /// is retried by the next publish.
    pub fn with_connector<F>(config: ProducerConfig, connector: F) -> Self
    where
        F: Fn(&ProducerConfig) -> Result<Arc<dyn MessageSink>> + Send + Sync + 'static,
    {
        Self {
            config,
            sink: OnceCell::new(),
            connector: Box::new(connector),
        }
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Publish a text message to `topic`.
    pub async fn publish(&self, topic: &str, message: &str) -> Result<()> {
        self.send(OutgoingRecord::new(topic, message.as_bytes()))
            .await
    }

    /// Publish a text message to `topic` with a partitioning key.
    pub async fn publish_keyed(&self, topic: &str, key: &str, message: &str) -> Result<()> {
        self.send(OutgoingRecord::new(topic, message.as_bytes()).with_key(key.as_bytes()))
            .await
    }

    /// Queue `record` and wait for outstanding deliveries.
    ///
    /// Enqueue and connection failures are returned. A flush that does not
    /// finish within the configured bound is logged and the call still
    /// succeeds; the delivery outcome is reported by the sink.
    pub async fn send(&self, record: OutgoingRecord<'_>) -> Result<()> {
        let sink = self.sink().await?;
        sink.enqueue(record)?;
        debug!("Queued {} bytes for topic {}", record.payload.len(), record.topic);

        let timeout = self.config.flush_timeout;
        let flushed = tokio::task::spawn_blocking(move || sink.flush(timeout)).await?;
        if let Err(e) = flushed {
            warn!(
                "Deliveries for topic {} not confirmed within {timeout:?}: {e}",
                record.topic
            );
        }
        Ok(())
    }

    async fn sink(&self) -> Result<Arc<dyn MessageSink>> {
        self.sink
            .get_or_try_init(|| async {
                info!("Creating Kafka producer for {}", self.config.broker.brokers);
                (self.connector)(&self.config)
            })
            .await
            .map(Arc::clone)
    }
}
