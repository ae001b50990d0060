//! Service layer error types

use presence_core::TransportError;
use thiserror::Error;

/// Why a presence batch yielded no new information
///
/// None of these are fatal: the caller logs the error and treats the batch
/// as empty.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Server rejected the presence request")]
    Rejected,

    #[error("Malformed presence response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Stable error kind for structured logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_FAILURE",
            Self::Rejected => "REJECTED",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors surfaced by the aggregator handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("Presence aggregator has shut down")]
    Closed,
}
