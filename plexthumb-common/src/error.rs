//! Common error types for plexthumb

use thiserror::Error;

/// Common result type for plexthumb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the agent crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON document could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration file could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Stored document exists but is not in the expected shape
    #[error("Document error: {0}")]
    Document(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
