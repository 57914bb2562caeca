use thiserror::Error;

/// Error type shared by the schema model, readers, builders and the diff engine.
#[derive(Error, Debug)]
pub enum DdlError {
    /// A schema model invariant is violated (duplicate names, dangling references).
    #[error("Validation error: {0}")]
    Validation(String),
    /// Reading the metadata of a single table failed.
    #[error("Metadata read error for table {table}: {message}")]
    MetadataRead { table: String, message: String },
    /// No platform is registered under the requested name.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
    /// The change-set cannot be ordered, e.g. tables referencing each other in a cycle.
    #[error("Dependency order error: {0}")]
    DependencyOrder(String),
    /// The dialect cannot express the requested statement.
    #[error("Operation {operation} is not supported by platform {platform}")]
    Unsupported { platform: String, operation: String },
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// Connection error (e.g., issues with network or database connection).
    #[error("Connection error: {0}")]
    Connection(String),
    /// Configuration error (e.g., invalid database URL or missing parameters).
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DdlError {
    pub fn validation(message: impl Into<String>) -> Self {
        DdlError::Validation(message.into())
    }

    pub fn metadata_read(table: impl Into<String>, message: impl Into<String>) -> Self {
        DdlError::MetadataRead {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(platform: impl Into<String>, operation: impl Into<String>) -> Self {
        DdlError::Unsupported {
            platform: platform.into(),
            operation: operation.into(),
        }
    }
}
