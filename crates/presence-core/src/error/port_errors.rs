//! Collaborator errors - failures reported through the transport and cache ports

use thiserror::Error;

use crate::value_objects::UserId;

/// Failures reported by the transport client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Not connected")]
    NotConnected,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Failures reported by the persistent cache
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Record not found: {0}")]
    NotFound(UserId),

    #[error("Record already exists: {0}")]
    AlreadyExists(UserId),

    #[error("Write failed: {0}")]
    Write(String),
}

impl CacheError {
    /// Check whether this is a missing-record error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
