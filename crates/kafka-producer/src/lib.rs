//! Kafka publisher for kafkalib.
//!
//! [`Publisher`] creates one producer on first use and reuses it for every
//! later call. Each publish queues the message and then flushes, waiting at
//! most [`ProducerConfig::flush_timeout`]. Delivery outcomes are logged by
//! [`DeliveryLogger`] rather than returned.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kafkalib_kafka_producer::Publisher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let publisher = Publisher::from_env()?;
//!     publisher.publish("orders", r#"{"id": 1}"#).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod publisher;
pub mod sink;

pub use config::{ProducerConfig, DEFAULT_FLUSH_TIMEOUT, KAFKA_FLUSH_TIMEOUT_MS};
pub use error::{PublishError, Result};
pub use publisher::Publisher;
pub use sink::{DeliveryLogger, MessageSink, OutgoingRecord, RdkafkaSink};
