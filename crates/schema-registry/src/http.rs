use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use apache_avro::Schema;
use async_trait::async_trait;
use kafka_types::{lookup_setting, process_env};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{RegistryError, Result};
use crate::registry::SchemaRegistry;

pub const KAFKA_SCHEMA_REGISTRY_URL: &str = "KAFKA_SCHEMA_REGISTRY_URL";
pub const KAFKA_SCHEMA_REGISTRY_USERNAME: &str = "KAFKA_SCHEMA_REGISTRY_USERNAME";
pub const KAFKA_SCHEMA_REGISTRY_PASSWORD: &str = "KAFKA_SCHEMA_REGISTRY_PASSWORD";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Schema registry connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Base URL, e.g. `http://localhost:8081`
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Registry settings from the process environment, `None` when no URL is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup_setting(&lookup, KAFKA_SCHEMA_REGISTRY_URL)?;
        Some(Self {
            url,
            username: lookup_setting(&lookup, KAFKA_SCHEMA_REGISTRY_USERNAME),
            password: lookup_setting(&lookup, KAFKA_SCHEMA_REGISTRY_PASSWORD),
        })
    }

    /// Credentials are only used when both halves are present.
    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    fn schema_url(&self, id: u32) -> String {
        format!("{}/schemas/ids/{id}", self.url.trim_end_matches('/'))
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Deserialize)]
struct SchemaResponse {
    schema: String,
    #[serde(rename = "schemaType")]
    schema_type: Option<String>,
}

/// Confluent-compatible schema registry client.
///
/// Schemas are fetched with `GET {url}/schemas/ids/{id}` and cached for the
/// lifetime of the client. Failed lookups are not cached, so a registry
/// outage does not poison later messages.
pub struct HttpSchemaRegistry {
    client: reqwest::Client,
    config: RegistryConfig,
    cache: RwLock<HashMap<u32, Arc<Schema>>>,
}

impl HttpSchemaRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        info!("Creating schema registry client for {}", config.url);
        Ok(Self {
            client,
            config,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Number of schemas currently cached.
    pub async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn fetch(&self, id: u32) -> Result<Schema> {
        let url = self.config.schema_url(id);
        debug!("Fetching schema {id} from {url}");

        let mut request = self.client.get(&url);
        if let Some((username, password)) = self.config.credentials() {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                id,
                status: status.as_u16(),
                body,
            });
        }

        let body: SchemaResponse = response.json().await?;
        if let Some(schema_type) = body.schema_type.filter(|t| !t.eq_ignore_ascii_case("AVRO")) {
            return Err(RegistryError::UnsupportedSchemaType { id, schema_type });
        }

        Schema::parse_str(&body.schema).map_err(|e| RegistryError::SchemaParse {
            id,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SchemaRegistry for HttpSchemaRegistry {
    async fn lookup(&self, id: u32) -> Result<Arc<Schema>> {
        if let Some(schema) = self.cache.read().await.get(&id) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.fetch(id).await?);
        let mut cache = self.cache.write().await;
        // Another task may have fetched the same id concurrently; keep the first.
        let cached = cache.entry(id).or_insert(schema);
        Ok(Arc::clone(cached))
    }
}
