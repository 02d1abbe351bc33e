//! Error types for RefSync

use thiserror::Error;

/// Result type for RefSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for RefSync
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Schema analysis error: {0}")]
    SchemaAnalysisError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Malformed reference input, rejected before any operation is planned
    #[error("Invalid specification: {0}")]
    InvalidSpecification(String),

    /// Target column or index already exists on add, or is missing on remove
    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Whether this error came from local validation of a reference
    pub fn is_invalid_specification(&self) -> bool {
        matches!(self, Error::InvalidSpecification(_))
    }

    /// Whether this error was reported while applying an operation
    pub fn is_schema_conflict(&self) -> bool {
        matches!(self, Error::SchemaConflict(_))
    }
}

/// Convert Serde JSON errors to RefSync errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to RefSync errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
