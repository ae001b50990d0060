//! Persistent user cache module.

mod user_records;

pub use user_records::MemoryUserCache;
