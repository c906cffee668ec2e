use std::time::Duration;

use kafka_types::{parse_setting, process_env, BrokerConfig};
use rdkafka::config::ClientConfig;

use crate::error::Result;

pub const KAFKA_FLUSH_TIMEOUT_MS: &str = "KAFKA_FLUSH_TIMEOUT_MS";

/// Upper bound on how long a publish call waits for outstanding deliveries.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for the Kafka producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    /// Broker address and security settings
    pub broker: BrokerConfig,
    /// How long each publish waits for the flush before giving up
    pub flush_timeout: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl ProducerConfig {
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            broker: BrokerConfig {
                brokers: brokers.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_flush_timeout(mut self, flush_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_ms = DEFAULT_FLUSH_TIMEOUT.as_millis() as u64;
        let flush_ms = parse_setting(&lookup, KAFKA_FLUSH_TIMEOUT_MS, default_ms)?;
        Ok(Self {
            broker: BrokerConfig::from_lookup(&lookup),
            flush_timeout: Duration::from_millis(flush_ms),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new();
        for (key, value) in self.broker.client_settings() {
            client.set(key, value);
        }
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ProducerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.flush_timeout, Duration::from_secs(15));
        assert_eq!(config.broker.brokers, "localhost:9092");
        assert_eq!(
            config.client_config().get("bootstrap.servers"),
            Some("localhost:9092")
        );
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            ("KAFKA_BROKER_URL", "kafka:9092"),
            ("KAFKA_BROKER_SASL_MECHANISM", "SCRAM-SHA-512"),
            (KAFKA_FLUSH_TIMEOUT_MS, "2500"),
        ]);
        let config = ProducerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.flush_timeout, Duration::from_millis(2500));
        let client = config.client_config();
        assert_eq!(client.get("bootstrap.servers"), Some("kafka:9092"));
        assert_eq!(client.get("sasl.mechanism"), Some("SCRAM-SHA-512"));
    }

    #[test]
    fn test_invalid_flush_timeout() {
        let err = ProducerConfig::from_lookup(|k| {
            (k == KAFKA_FLUSH_TIMEOUT_MS).then(|| "forever".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(KAFKA_FLUSH_TIMEOUT_MS));
    }
}
