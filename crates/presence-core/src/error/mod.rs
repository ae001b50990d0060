//! Collaborator error types

mod port_errors;

pub use port_errors::{CacheError, TransportError};
