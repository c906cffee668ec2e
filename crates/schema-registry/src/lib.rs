//! Schema registry support for kafkalib.
//!
//! Payloads written by registry-aware producers carry a marker byte and a
//! 4-byte schema id in front of the Avro body. This crate resolves those ids
//! and turns the body into JSON text for message handlers.
//!
//! - [`SchemaRegistry`] - lookup seam (`lookup(id) -> schema`)
//! - [`HttpSchemaRegistry`] - Confluent-compatible HTTP client with a schema cache
//! - [`InMemorySchemaRegistry`] - schemas registered in-process
//! - [`AvroDecoder`] - the decode step applied to each received record

pub mod decoder;
pub mod error;
pub mod http;
pub mod registry;

pub use decoder::AvroDecoder;
pub use error::{DecodeError, RegistryError, Result};
pub use http::{HttpSchemaRegistry, RegistryConfig};
pub use registry::{InMemorySchemaRegistry, SchemaRegistry};
