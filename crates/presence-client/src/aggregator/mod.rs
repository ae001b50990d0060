//! Presence aggregator: a handle plus the worker task it drives

mod handle;
mod worker;

pub use handle::PresenceAggregator;
pub use worker::BatchOutcome;
