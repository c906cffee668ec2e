use kafka_types::{lookup_setting, parse_setting, process_env, BrokerConfig, KafkaTypesError};
use rdkafka::config::ClientConfig;

use crate::error::Result;

pub const KAFKA_TOPIC: &str = "KAFKA_TOPIC";
pub const KAFKA_CONSUMER_GROUP_ID: &str = "KAFKA_CONSUMER_GROUP_ID";
pub const KAFKA_MAX_POLL_INTERVAL: &str = "KAFKA_MAX_POLL_INTERVAL";
pub const KAFKA_SESSION_TIMEOUT_MS: &str = "KAFKA_SESSION_TIMEOUT_MS";
pub const KAFKA_AUTO_COMMIT_INTERVAL_MS: &str = "KAFKA_AUTO_COMMIT_INTERVAL_MS";
pub const KAFKA_AUTO_OFFSET_RESET: &str = "KAFKA_AUTO_OFFSET_RESET";
pub const KAFKA_MAX_IN_FLIGHT: &str = "KAFKA_MAX_IN_FLIGHT";

pub const DEFAULT_GROUP_ID: &str = "default";
pub const DEFAULT_MAX_POLL_INTERVAL_MS: u32 = 300_000;
pub const DEFAULT_SESSION_TIMEOUT_MS: u32 = 30_000;
pub const DEFAULT_AUTO_COMMIT_INTERVAL_MS: u32 = 5_000;
pub const DEFAULT_AUTO_OFFSET_RESET: &str = "latest";
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Configuration for Kafka consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Broker address and security settings
    pub broker: BrokerConfig,
    /// Consumer group ID
    pub group_id: String,
    /// Topic to consume from
    pub topic: String,
    /// Maximum time between polls before the consumer leaves the group
    pub max_poll_interval_ms: u32,
    /// Session timeout in milliseconds
    pub session_timeout_ms: u32,
    /// How often offsets are committed in the background
    pub auto_commit_interval_ms: u32,
    /// Auto offset reset strategy ("earliest" or "latest")
    ///
    /// Applies when the group has no committed offset for a partition.
    pub auto_offset_reset: String,
    /// Maximum number of records handled concurrently
    ///
    /// The receive loop stops polling while this many handlers are running.
    /// Zero removes the bound.
    pub max_in_flight: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            topic: "".to_string(),
            max_poll_interval_ms: DEFAULT_MAX_POLL_INTERVAL_MS,
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT_MS,
            auto_commit_interval_ms: DEFAULT_AUTO_COMMIT_INTERVAL_MS,
            auto_offset_reset: DEFAULT_AUTO_OFFSET_RESET.to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl ConsumerConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(process_env)
    }

    /// Build the configuration from `lookup`, applying defaults for unset
    /// values. The topic is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let topic = lookup_setting(&lookup, KAFKA_TOPIC)
            .ok_or_else(|| KafkaTypesError::MissingSetting(KAFKA_TOPIC.to_string()))?;

        Ok(Self {
            broker: BrokerConfig::from_lookup(&lookup),
            group_id: lookup_setting(&lookup, KAFKA_CONSUMER_GROUP_ID)
                .unwrap_or_else(|| DEFAULT_GROUP_ID.to_string()),
            topic,
            max_poll_interval_ms: parse_setting(
                &lookup,
                KAFKA_MAX_POLL_INTERVAL,
                DEFAULT_MAX_POLL_INTERVAL_MS,
            )?,
            session_timeout_ms: parse_setting(
                &lookup,
                KAFKA_SESSION_TIMEOUT_MS,
                DEFAULT_SESSION_TIMEOUT_MS,
            )?,
            auto_commit_interval_ms: parse_setting(
                &lookup,
                KAFKA_AUTO_COMMIT_INTERVAL_MS,
                DEFAULT_AUTO_COMMIT_INTERVAL_MS,
            )?,
            auto_offset_reset: lookup_setting(&lookup, KAFKA_AUTO_OFFSET_RESET)
                .unwrap_or_else(|| DEFAULT_AUTO_OFFSET_RESET.to_string()),
            max_in_flight: parse_setting(&lookup, KAFKA_MAX_IN_FLIGHT, DEFAULT_MAX_IN_FLIGHT)?,
        })
    }

    /// librdkafka client configuration for a consumer in this group.
    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new();
        for (key, value) in self.broker.client_settings() {
            client.set(key, value);
        }
        client
            .set("group.id", &self.group_id)
            .set("max.poll.interval.ms", self.max_poll_interval_ms.to_string())
            .set("session.timeout.ms", self.session_timeout_ms.to_string())
            .set("enable.auto.commit", "true")
            .set(
                "auto.commit.interval.ms",
                self.auto_commit_interval_ms.to_string(),
            )
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("enable.partition.eof", "false");
        client
    }
}
