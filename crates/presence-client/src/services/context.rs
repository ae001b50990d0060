//! Service context - dependency container for presence services
//!
//! Holds the collaborators every service needs. Cloning is cheap; every
//! dependency sits behind an `Arc`.

use std::sync::Arc;

use presence_common::PresenceConfig;
use presence_core::{IdleScheduler, PresenceTransport, ReactiveStore, UserCache};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    transport: Arc<dyn PresenceTransport>,
    store: Arc<dyn ReactiveStore>,
    cache: Arc<dyn UserCache>,
    idle: Arc<dyn IdleScheduler>,
    config: PresenceConfig,
}

impl ServiceContext {
    /// Create a new service context
    pub fn new(
        transport: Arc<dyn PresenceTransport>,
        store: Arc<dyn ReactiveStore>,
        cache: Arc<dyn UserCache>,
        idle: Arc<dyn IdleScheduler>,
        config: PresenceConfig,
    ) -> Self {
        Self {
            transport,
            store,
            cache,
            idle,
            config,
        }
    }

    /// Get the transport client
    pub fn transport(&self) -> &Arc<dyn PresenceTransport> {
        &self.transport
    }

    /// Get the reactive store
    pub fn store(&self) -> &Arc<dyn ReactiveStore> {
        &self.store
    }

    /// Get the persistent user cache
    pub fn cache(&self) -> &Arc<dyn UserCache> {
        &self.cache
    }

    /// Get the idle-deferral scheduler
    pub fn idle(&self) -> &Arc<dyn IdleScheduler> {
        &self.idle
    }

    /// Get the presence settings
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }
}
