//! Request batching: the pending id set and its debounce timer

mod pending;
mod scheduler;

pub use pending::PendingIdSet;
pub use scheduler::{BatchScheduler, FireReceiver, FireToken};
