//! Collaborator traits (ports)

mod ports;

pub use ports::{
    CacheMutation, CacheResult, DeferredTask, IdleScheduler, PresenceTransport, ReactiveStore,
    RequestParams, StoreAction, StoreSnapshot, TransportResult, UserCache,
};
