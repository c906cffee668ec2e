//! One-call subscription: consumer, optional registry, dispatcher.

use std::sync::Arc;

use kafkalib_schema_registry::{AvroDecoder, HttpSchemaRegistry, RegistryConfig, SchemaRegistry};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ConsumerConfig;
use crate::consumer::KafkaConsumer;
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::error::Result;
use crate::handler::Handler;

/// Consume `config.topic`, passing every record to `handler` until `token`
/// is cancelled.
///
/// When `registry` is set, registry-framed Avro payloads are decoded to JSON
/// text before the handler sees them.
pub async fn run_subscription<H: Handler>(
    config: ConsumerConfig,
    registry: Option<Arc<dyn SchemaRegistry>>,
    handler: H,
    token: CancellationToken,
) -> Result<DispatchStats> {
    info!(
        "Starting subscription to topic {} in group {}",
        config.topic, config.group_id
    );
    let max_in_flight = config.max_in_flight;
    let consumer = KafkaConsumer::new(config)?;

    let mut dispatcher = Dispatcher::new(consumer, handler).with_max_in_flight(max_in_flight);
    if let Some(registry) = registry {
        dispatcher = dispatcher.with_decoder(AvroDecoder::new(registry));
    }

    Ok(dispatcher.run(token).await)
}

/// Build the HTTP registry client for `config`, if one is configured.
pub fn registry_from_config(
    config: Option<RegistryConfig>,
) -> Result<Option<Arc<dyn SchemaRegistry>>> {
    match config {
        Some(config) => {
            let registry: Arc<dyn SchemaRegistry> = Arc::new(HttpSchemaRegistry::new(config)?);
            Ok(Some(registry))
        }
        None => Ok(None),
    }
}
