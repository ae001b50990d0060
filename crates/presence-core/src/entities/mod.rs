//! Domain entities - presence snapshots and aggregates

mod presence;

pub use presence::{ActiveUser, ActiveUsers, CachedUser, PresenceRecord, PresenceStatus};
