//! Kafka message types.
//!
//! Owned copies of records received from a topic. These types are shared
//! between the consumer crate, the schema-registry decode step and handlers.

use serde::de::DeserializeOwned;

/// A Kafka record with metadata.
///
/// Holds the payload together with the Kafka-specific metadata (topic,
/// partition, offset, etc.). The payload starts out as the raw bytes read from
/// the broker and may be replaced by the decode step.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Message payload
    pub payload: Payload,
    /// Kafka topic name
    pub topic: String,
    /// Kafka partition number
    pub partition: i32,
    /// Kafka offset within the partition
    pub offset: i64,
    /// Message key (if any)
    pub key: Option<Vec<u8>>,
    /// Message timestamp in milliseconds since epoch (if available)
    pub timestamp: Option<i64>,
}

/// Message payload variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Bytes exactly as they arrived from the broker
    Raw(Vec<u8>),
    /// Avro body decoded against a registry schema and rendered as JSON text
    Decoded { schema_id: u32, text: String },
}

impl Message {
    /// Create a record with a raw payload and no key or timestamp.
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, payload: Vec<u8>) -> Self {
        Self {
            payload: Payload::Raw(payload),
            topic: topic.into(),
            partition,
            offset,
            key: None,
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    /// Current payload bytes, raw or decoded.
    pub fn payload_bytes(&self) -> &[u8] {
        match &self.payload {
            Payload::Raw(bytes) => bytes,
            Payload::Decoded { text, .. } => text.as_bytes(),
        }
    }

    /// Payload as text, replacing invalid UTF-8 sequences.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(self.payload_bytes()).into_owned()
    }

    /// Schema id of a decoded payload.
    pub fn schema_id(&self) -> Option<u32> {
        match &self.payload {
            Payload::Raw(_) => None,
            Payload::Decoded { schema_id, .. } => Some(*schema_id),
        }
    }

    /// Replace the payload with its decoded textual form.
    pub fn set_decoded(&mut self, schema_id: u32, text: String) {
        self.payload = Payload::Decoded { schema_id, text };
    }

    /// Parse the payload as JSON into `T`.
    pub fn parse_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        parse_json(self)
    }
}

/// Parse a record's payload as JSON into a caller-chosen structure.
///
/// Works on raw JSON payloads and on payloads produced by the Avro decode
/// step alike.
pub fn parse_json<T: DeserializeOwned>(message: &Message) -> serde_json::Result<T> {
    serde_json::from_slice(message.payload_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: String,
        quantity: u32,
    }

    #[test]
    fn test_parse_json_raw_payload() {
        let message = Message::new("orders", 0, 7, br#"{"id":"o-1","quantity":3}"#.to_vec());
        let order: Order = message.parse_json().unwrap();
        assert_eq!(
            order,
            Order {
                id: "o-1".to_string(),
                quantity: 3
            }
        );
    }

    #[test]
    fn test_parse_json_decoded_payload() {
        let mut message = Message::new("orders", 0, 7, vec![0, 0, 0, 0, 1, 2]);
        message.set_decoded(1, r#"{"id":"o-2","quantity":1}"#.to_string());
        let order: Order = parse_json(&message).unwrap();
        assert_eq!(order.id, "o-2");
        assert_eq!(message.schema_id(), Some(1));
    }

    #[test]
    fn test_parse_json_reports_error() {
        let message = Message::new("orders", 0, 7, b"not json".to_vec());
        let result: serde_json::Result<Order> = message.parse_json();
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_text_lossy() {
        let message = Message::new("t", 1, 2, vec![b'a', 0xff, b'b']);
        assert_eq!(message.payload_text(), "a\u{fffd}b");
        assert_eq!(message.schema_id(), None);
    }
}
