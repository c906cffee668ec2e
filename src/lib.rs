//! kafkalib: publish string messages to Kafka topics and subscribe to a
//! topic with a per-message handler.
//!
//! Configuration comes from `KAFKA_*` environment variables, which may also be
//! placed in a `.env` file in the working directory. Payloads framed
//! by a schema registry (marker byte, 4-byte schema id, Avro body) are
//! decoded to JSON text before the handler sees them when
//! `KAFKA_SCHEMA_REGISTRY_URL` is set.
//!
//! ```rust,no_run
//! use kafkalib::Message;
//!
//! #[derive(serde::Deserialize)]
//! struct Order {
//!     id: u64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     kafkalib::publish("orders", r#"{"id": 7}"#).await?;
//!
//!     kafkalib::subscribe(|message: Message| async move {
//!         let order: Order = message.parse_json()?;
//!         println!("order {}", order.id);
//!         anyhow::Ok(())
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

use std::sync::OnceLock;

use anyhow::Context;
use tracing::{info, warn};

pub mod config;

pub use kafka_types::{parse_json, BrokerConfig, Message, Payload};
pub use kafkalib_kafka_producer::{
    DeliveryLogger, MessageSink, OutgoingRecord, ProducerConfig, PublishError, Publisher,
    RdkafkaSink,
};
pub use kafkalib_kafka_source::{
    ChannelSource, ConsumerConfig, DispatchStats, Dispatcher, Handler, HandlerFuture,
    KafkaConsumer, RecordSource,
};
pub use kafkalib_schema_registry::{
    AvroDecoder, DecodeError, HttpSchemaRegistry, InMemorySchemaRegistry, RegistryConfig,
    RegistryError, SchemaRegistry,
};
pub use tokio_util::sync::CancellationToken;

static PUBLISHER: OnceLock<Publisher> = OnceLock::new();

fn publisher() -> anyhow::Result<&'static Publisher> {
    if let Some(publisher) = PUBLISHER.get() {
        return Ok(publisher);
    }
    kafka_types::load_dotenv();
    let publisher = Publisher::from_env().context("Failed to load producer configuration")?;
    Ok(PUBLISHER.get_or_init(|| publisher))
}

/// Publish `message` to `topic` through the process-wide publisher.
///
/// The publisher is configured from the environment on first use and its
/// producer is shared by every later call.
pub async fn publish(topic: &str, message: &str) -> anyhow::Result<()> {
    publisher()?
        .publish(topic, message)
        .await
        .with_context(|| format!("Failed to publish to topic {topic}"))
}

/// Like [`publish`], with a partitioning key.
pub async fn publish_keyed(topic: &str, key: &str, message: &str) -> anyhow::Result<()> {
    publisher()?
        .publish_keyed(topic, key, message)
        .await
        .with_context(|| format!("Failed to publish to topic {topic}"))
}

/// Subscribe to `KAFKA_TOPIC` and run `handler` for each record until Ctrl-C.
pub async fn subscribe<H: Handler>(handler: H) -> anyhow::Result<DispatchStats> {
    let token = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(token.clone()));

    let result = subscribe_until(handler, token.clone()).await;

    token.cancel();
    if let Err(e) = watcher.await {
        warn!("Ctrl-C watcher failed: {e}");
    }
    result
}

/// Subscribe to `KAFKA_TOPIC` and run `handler` for each record until
/// `token` is cancelled.
pub async fn subscribe_until<H: Handler>(
    handler: H,
    token: CancellationToken,
) -> anyhow::Result<DispatchStats> {
    kafka_types::load_dotenv();
    let config = ConsumerConfig::from_env().context("Failed to load consumer configuration")?;
    subscribe_with(config, handler, token).await
}

/// Subscribe using an explicit consumer configuration. The schema registry
/// is still taken from the environment.
pub async fn subscribe_with<H: Handler>(
    config: ConsumerConfig,
    handler: H,
    token: CancellationToken,
) -> anyhow::Result<DispatchStats> {
    kafka_types::load_dotenv();
    let registry = kafkalib_kafka_source::registry_from_config(RegistryConfig::from_env())
        .context("Failed to create schema registry client")?;
    let topic = config.topic.clone();

    let stats = kafkalib_kafka_source::run_subscription(config, registry, handler, token)
        .await
        .with_context(|| format!("Failed to subscribe to topic {topic}"))?;

    info!(
        "Subscription to {topic} stopped: {} received, {} handled, {} decode failures, {} handler failures",
        stats.received, stats.handled, stats.decode_failures, stats.handler_failures
    );
    Ok(stats)
}

/// Cancel `token` on Ctrl-C. Returns early if the token is cancelled first.
pub async fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Received Ctrl-C, stopping");
                token.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
        },
    }
}
