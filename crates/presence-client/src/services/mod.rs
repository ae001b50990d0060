//! Presence services
//!
//! Each service borrows the shared [`ServiceContext`] and performs one step
//! of the presence pipeline: fetching, distributing, or subscribing.

pub mod context;
pub mod distributor;
pub mod error;
pub mod fetcher;
pub mod subscriptions;

// Re-export all services for convenience
pub use context::ServiceContext;
pub use distributor::{DistributionReport, ResultDistributor};
pub use error::{AggregatorError, FetchError, FetchResult};
pub use fetcher::{FetchedPresence, PresenceFetcher, PresenceMap, IDS_PARAM};
pub use subscriptions::{
    Subscription, SubscriptionManager, ACTIVE_USERS_CHANNEL, STREAM_NOTIFY_LOGGED,
    USER_PRESENCE_STREAM,
};
