//! Environment-provided settings shared by the consumer and the producer.
//!
//! Every loader takes a lookup function instead of reading the process
//! environment directly, so callers can feed settings from anywhere.
//! Empty values count as unset.
//!
//! [`load_dotenv`] copies a `.env` file into the process environment so that
//! [`process_env`] sees its values. Variables already set take precedence.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Once;

use tracing::{debug, warn};

use crate::error::{KafkaTypesError, Result};

pub const KAFKA_BROKER_URL: &str = "KAFKA_BROKER_URL";
pub const KAFKA_BROKER_SECURITY_PROTOCOL: &str = "KAFKA_BROKER_SECURITY_PROTOCOL";
pub const KAFKA_BROKER_SASL_MECHANISM: &str = "KAFKA_BROKER_SASL_MECHANISM";
pub const KAFKA_BROKER_SASL_USERNAME: &str = "KAFKA_BROKER_SASL_USERNAME";
pub const KAFKA_BROKER_SASL_PASSWORD: &str = "KAFKA_BROKER_SASL_PASSWORD";

pub const DEFAULT_BROKER_URL: &str = "localhost:9092";

/// Read a variable from the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

static DOTENV: Once = Once::new();

/// Load `.env` from the working directory or one of its parents, once per
/// process. A missing file is not an error.
pub fn load_dotenv() {
    DOTENV.call_once(|| match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {e}"),
    });
}

/// Load the environment file at `path`.
pub fn load_dotenv_from(path: &Path) -> Result<()> {
    dotenvy::from_path(path).map_err(|e| KafkaTypesError::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    debug!("Loaded environment from {}", path.display());
    Ok(())
}

/// Look up `key`, treating empty or whitespace-only values as unset.
pub fn lookup_setting<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Look up `key` and parse it, falling back to `default` when unset.
pub fn parse_setting<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup_setting(lookup, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| KafkaTypesError::InvalidConfig {
                key: key.to_string(),
                message: format!("'{raw}': {e}"),
            }),
        None => Ok(default),
    }
}

/// Broker address and security settings.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    pub security_protocol: Option<String>,
    pub sasl_mechanism: Option<String>,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            brokers: DEFAULT_BROKER_URL.to_string(),
            security_protocol: None,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
        }
    }
}

impl BrokerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            brokers: lookup_setting(&lookup, KAFKA_BROKER_URL)
                .unwrap_or_else(|| DEFAULT_BROKER_URL.to_string()),
            security_protocol: lookup_setting(&lookup, KAFKA_BROKER_SECURITY_PROTOCOL),
            sasl_mechanism: lookup_setting(&lookup, KAFKA_BROKER_SASL_MECHANISM),
            sasl_username: lookup_setting(&lookup, KAFKA_BROKER_SASL_USERNAME),
            sasl_password: lookup_setting(&lookup, KAFKA_BROKER_SASL_PASSWORD),
        }
    }

    /// librdkafka properties for these settings. Unset options are omitted
    /// so the client keeps its own defaults.
    pub fn client_settings(&self) -> Vec<(&'static str, String)> {
        let mut settings = vec![("bootstrap.servers", self.brokers.clone())];
        let optional = [
            ("security.protocol", &self.security_protocol),
            ("sasl.mechanism", &self.sasl_mechanism),
            ("sasl.username", &self.sasl_username),
            ("sasl.password", &self.sasl_password),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                settings.push((key, value.clone()));
            }
        }
        settings
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("brokers", &self.brokers)
            .field("security_protocol", &self.security_protocol)
            .field("sasl_mechanism", &self.sasl_mechanism)
            .field("sasl_username", &self.sasl_username)
            .field("sasl_password", &self.sasl_password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_broker_config_defaults() {
        let config = BrokerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, BrokerConfig::default());
        assert_eq!(
            config.client_settings(),
            vec![("bootstrap.servers", DEFAULT_BROKER_URL.to_string())]
        );
    }

    #[test]
    fn test_broker_config_with_sasl() {
        let config = BrokerConfig::from_lookup(lookup_from(&[
            (KAFKA_BROKER_URL, "broker-1:9093,broker-2:9093"),
            (KAFKA_BROKER_SECURITY_PROTOCOL, "SASL_SSL"),
            (KAFKA_BROKER_SASL_MECHANISM, "PLAIN"),
            (KAFKA_BROKER_SASL_USERNAME, "svc"),
            (KAFKA_BROKER_SASL_PASSWORD, "secret"),
        ]));

        let settings: HashMap<_, _> = config.client_settings().into_iter().collect();
        assert_eq!(settings["bootstrap.servers"], "broker-1:9093,broker-2:9093");
        assert_eq!(settings["security.protocol"], "SASL_SSL");
        assert_eq!(settings["sasl.mechanism"], "PLAIN");
        assert_eq!(settings["sasl.username"], "svc");
        assert_eq!(settings["sasl.password"], "secret");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let lookup = lookup_from(&[(KAFKA_BROKER_URL, ""), (KAFKA_BROKER_SASL_MECHANISM, "  ")]);
        let config = BrokerConfig::from_lookup(lookup);
        assert_eq!(config.brokers, DEFAULT_BROKER_URL);
        assert_eq!(config.sasl_mechanism, None);
    }

    #[test]
    fn test_parse_setting() {
        let lookup = lookup_from(&[("N", "12"), ("BAD", "twelve")]);
        assert_eq!(parse_setting(&lookup, "N", 5usize).unwrap(), 12);
        assert_eq!(parse_setting(&lookup, "MISSING", 5usize).unwrap(), 5);
        let err = parse_setting(&lookup, "BAD", 5usize).unwrap_err();
        assert!(err.to_string().contains("BAD"));
    }

    #[test]
    fn test_missing_env_file_is_error() {
        let err = load_dotenv_from(Path::new("/nonexistent/kafkalib/.env")).unwrap_err();
        assert!(matches!(err, KafkaTypesError::EnvFile { .. }));
    }
}
