use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use apache_avro::Schema;
use async_trait::async_trait;

use crate::error::{RegistryError, Result};

/// Resolves schema ids found in framed payloads to parsed Avro schemas.
///
/// Implementations decide their own caching policy.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    async fn lookup(&self, id: u32) -> Result<Arc<Schema>>;
}

/// Registry backed by schemas registered in-process.
///
/// Useful when schemas ship with the application, and for tests that should
/// not reach a registry server.
#[derive(Default)]
pub struct InMemorySchemaRegistry {
    schemas: RwLock<HashMap<u32, Arc<Schema>>>,
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: u32, schema: Schema) {
        let mut schemas = self
            .schemas
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        schemas.insert(id, Arc::new(schema));
    }

    /// Parse `schema` as Avro JSON and register it under `id`.
    pub fn register_str(&self, id: u32, schema: &str) -> Result<()> {
        let parsed = Schema::parse_str(schema).map_err(|e| RegistryError::SchemaParse {
            id,
            message: e.to_string(),
        })?;
        self.register(id, parsed);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SchemaRegistry for InMemorySchemaRegistry {
    async fn lookup(&self, id: u32) -> Result<Arc<Schema>> {
        self.schemas
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let registry = InMemorySchemaRegistry::new();
        assert!(registry.is_empty());
        registry.register_str(3, r#""string""#).unwrap();

        let schema = registry.lookup(3).await.unwrap();
        assert_eq!(*schema, Schema::String);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_missing_schema() {
        let registry = InMemorySchemaRegistry::new();
        let err = registry.lookup(9).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(9)));
    }

    #[test]
    fn test_register_invalid_schema() {
        let registry = InMemorySchemaRegistry::new();
        let err = registry.register_str(1, "{not avro").unwrap_err();
        assert!(matches!(err, RegistryError::SchemaParse { id: 1, .. }));
    }
}
