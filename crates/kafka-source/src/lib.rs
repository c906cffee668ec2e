//! Kafka consumer and dispatcher for kafkalib.
//!
//! This crate provides:
//! - Consumer configuration loaded from the environment with documented defaults
//! - A Kafka-backed [`RecordSource`] and an in-process [`ChannelSource`]
//! - The [`Dispatcher`] receive loop: optional Avro decoding, one isolated
//!   task per record, bounded fan-out and cancellation
//!
//! # Example
//!
//! ```rust,no_run
//! use kafkalib_kafka_source::{run_subscription, ConsumerConfig, Message};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ConsumerConfig::new("user-events");
//! let token = CancellationToken::new();
//!
//! run_subscription(config, None, |message: Message| async move {
//!     println!("{}", message.payload_text());
//!     anyhow::Ok(())
//! }, token)
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;

/// Kafka consumer subscribed to one topic
pub mod consumer;

/// Receive loop with per-record isolation
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod source;
pub mod subscription;

// Re-export from kafka-types for convenience
pub use kafka_types::{Message, Payload};

pub use config::ConsumerConfig;
pub use consumer::KafkaConsumer;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{Error, Result};
pub use handler::{Handler, HandlerFuture};
pub use source::{ChannelSource, RecordSource};
pub use subscription::{registry_from_config, run_subscription};
