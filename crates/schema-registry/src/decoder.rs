use std::sync::Arc;

use kafka_types::{avro_to_text, split_framed, Message};
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::registry::SchemaRegistry;

/// Decode step for registry-framed Avro payloads.
///
/// A framed payload is looked up by schema id, decoded from Avro binary and
/// replaced with its JSON text. Payloads without valid framing are passed
/// through unchanged so handlers still see them.
#[derive(Clone)]
pub struct AvroDecoder {
    registry: Arc<dyn SchemaRegistry>,
}

impl AvroDecoder {
    pub fn new(registry: Arc<dyn SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<dyn SchemaRegistry> {
        &self.registry
    }

    /// Decode `message` in place.
    ///
    /// Returns the message unchanged when the payload is not framed. Schema
    /// lookup failures and bodies that do not match the schema are errors.
    pub async fn decode(&self, mut message: Message) -> Result<Message, DecodeError> {
        if message.schema_id().is_some() {
            return Ok(message);
        }

        let (schema_id, text) = {
            let framed = match split_framed(message.payload_bytes()) {
                Ok(framed) => framed,
                Err(e) => {
                    warn!(
                        "Failed to get schema id from message at {}/{}@{} ({e}): {}",
                        message.topic,
                        message.partition,
                        message.offset,
                        message.payload_text()
                    );
                    return Ok(message);
                }
            };

            let schema = self
                .registry
                .lookup(framed.schema_id)
                .await
                .map_err(|source| DecodeError::SchemaLookup {
                    schema_id: framed.schema_id,
                    source,
                })?;

            let mut body = framed.body;
            let value = apache_avro::from_avro_datum(&schema, &mut body, None).map_err(|e| {
                DecodeError::Avro {
                    schema_id: framed.schema_id,
                    message: e.to_string(),
                }
            })?;
            if !body.is_empty() {
                debug!(
                    "{} trailing bytes after Avro datum for schema {}",
                    body.len(),
                    framed.schema_id
                );
            }

            (framed.schema_id, avro_to_text(&value))
        };

        message.set_decoded(schema_id, text);
        Ok(message)
    }
}
