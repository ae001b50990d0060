//! Collaborator traits (ports) - the interfaces the presence core depends on
//!
//! The core never talks to a concrete transport, store, or database. Callers
//! supply implementations of these traits; `presence-cache` ships in-memory
//! ones.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::entities::{ActiveUsers, CachedUser, PresenceStatus};
use crate::error::{CacheError, TransportError};
use crate::value_objects::UserId;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for persistent cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Query parameters of a REST call
pub type RequestParams = BTreeMap<String, String>;

// ============================================================================
// Transport
// ============================================================================

#[async_trait]
pub trait PresenceTransport: Send + Sync {
    /// Perform a REST `GET` and return the decoded JSON body
    async fn get(&self, endpoint: &str, params: &RequestParams) -> TransportResult<serde_json::Value>;

    /// Subscribe to a named stream. Re-subscribing an active stream is a no-op.
    async fn subscribe(&self, channel: &str, args: &[serde_json::Value]) -> TransportResult<()>;

    /// Send a raw subscription message with a caller-built payload
    async fn subscribe_raw(&self, channel: &str, payload: serde_json::Value) -> TransportResult<()>;
}

// ============================================================================
// Reactive store
// ============================================================================

/// The parts of application state the presence core reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Version reported by the connected server
    pub server_version: Option<String>,
    /// Currently authenticated user
    pub login_user: Option<UserId>,
}

/// Actions the presence core dispatches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreAction {
    /// Merge a batch of presence into the active-users map
    SetActiveUsers { users: ActiveUsers },
    /// Update the authenticated user's own status
    SetUser {
        status: PresenceStatus,
        status_text: Option<String>,
    },
}

pub trait ReactiveStore: Send + Sync {
    /// Read the current state
    fn state(&self) -> StoreSnapshot;

    /// Apply an action
    fn dispatch(&self, action: StoreAction);
}

// ============================================================================
// Persistent cache
// ============================================================================

/// A single scoped write, committed or rolled back as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMutation {
    Create(CachedUser),
    Update(CachedUser),
}

impl CacheMutation {
    /// Id of the row this mutation touches
    #[must_use]
    pub fn id(&self) -> &UserId {
        match self {
            Self::Create(user) | Self::Update(user) => &user.id,
        }
    }
}

#[async_trait]
pub trait UserCache: Send + Sync {
    /// Find a user row, failing with [`CacheError::NotFound`] when absent
    async fn find(&self, id: &UserId) -> CacheResult<CachedUser>;

    /// Commit one mutation
    async fn write(&self, mutation: CacheMutation) -> CacheResult<()>;
}

// ============================================================================
// Idle scheduler
// ============================================================================

/// Work deferred until the interface is idle
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

pub trait IdleScheduler: Send + Sync {
    /// Run `task` once no interaction is in progress. Tasks run in FIFO order.
    fn run_after_interactions(&self, task: DeferredTask);
}
