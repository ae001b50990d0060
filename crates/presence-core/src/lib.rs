//! # presence-core
//!
//! Domain layer for presence aggregation: user ids, presence snapshots,
//! server-version protocol selection, and the collaborator traits the client
//! depends on. Nothing here performs I/O.

pub mod entities;
pub mod error;
pub mod protocol;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{ActiveUser, ActiveUsers, CachedUser, PresenceRecord, PresenceStatus};
pub use error::{CacheError, TransportError};
pub use protocol::{ProtocolDecision, ProtocolGeneration, StatusChannel};
pub use traits::{
    CacheMutation, CacheResult, DeferredTask, IdleScheduler, PresenceTransport, ReactiveStore,
    RequestParams, StoreAction, StoreSnapshot, TransportResult, UserCache,
};
pub use value_objects::{ServerVersion, ServerVersionParseError, UserId, UserIdParseError};
