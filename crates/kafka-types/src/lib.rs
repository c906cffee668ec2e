//! Shared Kafka record types for kafkalib.
//!
//! This crate holds the pieces used by both the consumer and the producer
//! side, without depending on the Kafka client itself.
//!
//! # Modules
//!
//! - [`message`] - Owned record type and the JSON parse helper
//! - [`framing`] - Schema-registry wire framing (marker byte + schema id + body)
//! - [`avro`] - Avro value → JSON text conversion used by the decode step
//! - [`env`] - Environment lookup helpers, `.env` loading and broker connection settings
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use kafka_types::{encode_framed, split_framed};
//!
//! let framed = encode_framed(7, &[2, 4]);
//! let split = split_framed(&framed).unwrap();
//! assert_eq!(split.schema_id, 7);
//! assert_eq!(split.body, &[2, 4]);
//! ```

pub mod avro;
pub mod env;
pub mod error;
pub mod framing;
pub mod message;

pub use avro::{avro_to_json, avro_to_text};
pub use env::{
    load_dotenv, load_dotenv_from, lookup_setting, parse_setting, process_env, BrokerConfig,
};
pub use error::{KafkaTypesError, Result};
pub use framing::{encode_framed, split_framed, FramedPayload, MAGIC_BYTE, MIN_FRAMED_LEN};
pub use message::{parse_json, Message, Payload};
