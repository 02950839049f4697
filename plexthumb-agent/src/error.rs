//! Error types for plexthumb-agent

use crate::library::LibraryError;
use crate::media_server::MediaServerError;
use thiserror::Error;

/// Agent error type
#[derive(Debug, Error)]
pub enum AgentError {
    /// Media server unreachable, non-success status or unusable document
    #[error("Media server error: {0}")]
    MediaServer(#[from] MediaServerError),

    /// Library service client could not be built or called
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// plexthumb-common error (configuration, storage)
    #[error("Common error: {0}")]
    Common(#[from] plexthumb_common::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
