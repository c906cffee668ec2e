use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Schema registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Schema registry returned {status} for schema {id}: {body}")]
    Status { id: u32, status: u16, body: String },

    #[error("Schema {id} could not be parsed: {message}")]
    SchemaParse { id: u32, message: String },

    #[error("Schema {id} has unsupported type {schema_type}")]
    UnsupportedSchemaType { id: u32, schema_type: String },

    #[error("Schema {0} not found")]
    NotFound(u32),
}

/// Failures of the decode step that drop the record.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Error getting the schema with id '{schema_id}': {source}")]
    SchemaLookup {
        schema_id: u32,
        #[source]
        source: RegistryError,
    },

    #[error("Payload does not match schema {schema_id}: {message}")]
    Avro { schema_id: u32, message: String },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
