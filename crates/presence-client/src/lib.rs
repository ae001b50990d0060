//! # presence-client
//!
//! Collects presence requests from many independent UI elements, coalesces
//! them into one request per debounce window, shapes that request for the
//! protocol generation of the connected server, and fans the result out to
//! the store, the idle-deferred active-users map, and the persistent cache.
//!
//! ## Example
//!
//! ```ignore
//! use presence_client::{PresenceAggregator, ServiceContext};
//!
//! let ctx = ServiceContext::new(transport, store, cache, idle, config.presence);
//! let aggregator = PresenceAggregator::spawn(ctx);
//!
//! aggregator.establish_subscriptions(Some("4.2.0".into())).await?;
//! aggregator.request_presence(user_id)?;
//! ```

pub mod aggregator;
pub mod batch;
pub mod dto;
pub mod services;

#[cfg(test)]
mod testing;

pub use aggregator::{BatchOutcome, PresenceAggregator};
pub use batch::{BatchScheduler, PendingIdSet};
pub use services::{
    AggregatorError, DistributionReport, FetchError, FetchResult, FetchedPresence,
    PresenceFetcher, PresenceMap, ResultDistributor, ServiceContext, Subscription,
    SubscriptionManager,
};
