//! # presence-cache
//!
//! In-memory implementations of the collaborators the presence client needs.
//!
//! ## Features
//!
//! - **Reactive store**: `MemoryStore` holds server/login state and reduces
//!   active-user updates
//! - **Persistent cache**: `MemoryUserCache` stores one row per user with
//!   atomic per-row writes
//! - **Idle scheduler**: `InteractionQueue` defers work until no interaction
//!   guard is held, in FIFO order
//!
//! ## Example
//!
//! ```ignore
//! use presence_cache::{InteractionQueue, MemoryStore, MemoryUserCache};
//!
//! let store = MemoryStore::new_shared();
//! store.set_server_version("4.2.0");
//! let cache = MemoryUserCache::new_shared();
//! let idle = InteractionQueue::spawn();
//!
//! let gesture = idle.begin_interaction();
//! // deferred work waits until `gesture` is dropped
//! ```

pub mod idle;
pub mod records;
pub mod store;

pub use idle::{InteractionGuard, InteractionQueue};
pub use records::MemoryUserCache;
pub use store::{LoginUser, MemoryStore, StoreState, DEFAULT_HISTORY_LIMIT};
