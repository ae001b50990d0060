//! User rows kept in memory.
//!
//! Each write touches exactly one row through the `DashMap` entry API, so a
//! mutation is either fully applied or not applied at all.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use presence_core::{CacheError, CacheMutation, CacheResult, CachedUser, UserCache, UserId};
use std::sync::Arc;

/// In-memory persistent cache implementing [`UserCache`]
#[derive(Default)]
pub struct MemoryUserCache {
    rows: DashMap<UserId, CachedUser>,
}

impl MemoryUserCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Get a row without going through the async interface
    #[must_use]
    pub fn get(&self, id: &UserId) -> Option<CachedUser> {
        self.rows.get(id).map(|row| row.clone())
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl UserCache for MemoryUserCache {
    async fn find(&self, id: &UserId) -> CacheResult<CachedUser> {
        self.get(id).ok_or_else(|| CacheError::NotFound(id.clone()))
    }

    async fn write(&self, mutation: CacheMutation) -> CacheResult<()> {
        match mutation {
            CacheMutation::Create(user) => match self.rows.entry(user.id.clone()) {
                Entry::Occupied(_) => Err(CacheError::AlreadyExists(user.id)),
                Entry::Vacant(slot) => {
                    tracing::trace!(user_id = %user.id, "Cached user created");
                    slot.insert(user);
                    Ok(())
                }
            },
            CacheMutation::Update(user) => match self.rows.entry(user.id.clone()) {
                Entry::Occupied(mut slot) => {
                    tracing::trace!(user_id = %user.id, "Cached user updated");
                    slot.insert(user);
                    Ok(())
                }
                Entry::Vacant(_) => Err(CacheError::NotFound(user.id)),
            },
        }
    }
}
