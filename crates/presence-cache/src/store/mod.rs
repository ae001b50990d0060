//! Reactive store module.

mod memory_store;

pub use memory_store::{LoginUser, MemoryStore, StoreState, DEFAULT_HISTORY_LIMIT};
