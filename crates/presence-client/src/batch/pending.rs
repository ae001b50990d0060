//! Pending id set
//!
//! Ids waiting for the next batch. Insertion order is kept so the request
//! payload is stable; duplicates are ignored.

use presence_core::UserId;
use std::collections::HashSet;

/// Ids requested since the last drain
#[derive(Debug, Default)]
pub struct PendingIdSet {
    order: Vec<UserId>,
    seen: HashSet<UserId>,
}

impl PendingIdSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an id. Returns `false` if it was already queued.
    pub fn insert(&mut self, id: UserId) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Take every queued id, leaving the set empty
    pub fn drain(&mut self) -> Vec<UserId> {
        self.seen.clear();
        std::mem::take(&mut self.order)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
