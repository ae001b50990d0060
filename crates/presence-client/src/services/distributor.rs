//! Result distributor
//!
//! Fans one fetch result out to the three consumers: the login slice of
//! the store (synchronously), the active-users map (deferred until the UI is
//! idle), and the persistent user cache (one isolated upsert per id).
//!
//! Only requested ids reach the store. Users the server volunteered are
//! written to the cache and nowhere else.

use futures::future::join_all;
use presence_core::{
    ActiveUsers, CacheMutation, CacheResult, CachedUser, PresenceRecord, StoreAction, UserId,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::context::ServiceContext;
use super::fetcher::{FetchedPresence, PresenceMap};

/// What a distribution did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionReport {
    /// Users handed to the deferred active-users update
    pub dispatched: usize,
    /// Whether the authenticated user's own status was updated
    pub self_updated: bool,
    /// Cache rows written
    pub persisted: usize,
    /// Ids whose cache write failed
    pub failed: Vec<UserId>,
}

/// Result distributor
pub struct ResultDistributor<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ResultDistributor<'a> {
    /// Create a new ResultDistributor
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Deliver a fetch result
    #[instrument(
        skip(self, presences),
        fields(
            requested = presences.requested.len(),
            unrequested = presences.unrequested.len()
        )
    )]
    pub async fn distribute(&self, presences: &FetchedPresence) -> DistributionReport {
        let mut report = DistributionReport::default();
        if presences.is_empty() {
            return report;
        }

        if !presences.requested.is_empty() {
            report.self_updated = self.update_login_user(&presences.requested);
            report.dispatched = self.defer_active_users(&presences.requested);
        }

        let writes = presences.records().map(|record| async move {
            (record.id.clone(), self.upsert(record).await)
        });

        for (id, result) in join_all(writes).await {
            match result {
                Ok(()) => report.persisted += 1,
                Err(e) => {
                    warn!(user_id = %id, error = %e, "Failed to persist presence");
                    report.failed.push(id);
                }
            }
        }

        debug!(
            dispatched = report.dispatched,
            persisted = report.persisted,
            failed = report.failed.len(),
            "Presence distributed"
        );

        report
    }

    /// Mirror the authenticated user's own record into the login slice
    fn update_login_user(&self, presences: &PresenceMap) -> bool {
        let store = self.ctx.store();
        let Some(login) = store.state().login_user else {
            return false;
        };
        let Some(record) = presences.get(&login) else {
            return false;
        };

        store.dispatch(StoreAction::SetUser {
            status: record.status,
            status_text: record.status_text.clone(),
        });
        true
    }

    /// Queue one combined active-users update for when the UI is idle
    fn defer_active_users(&self, presences: &PresenceMap) -> usize {
        let users: ActiveUsers = presences.values().collect();
        let count = users.len();
        let store = Arc::clone(self.ctx.store());

        self.ctx.idle().run_after_interactions(Box::new(move || {
            store.dispatch(StoreAction::SetActiveUsers { users });
        }));

        count
    }

    /// Update the row if it exists, otherwise create it
    async fn upsert(&self, record: &PresenceRecord) -> CacheResult<()> {
        let cache = self.ctx.cache();

        match cache.find(&record.id).await {
            Ok(mut existing) => {
                existing.apply(record);
                match cache.write(CacheMutation::Update(existing)).await {
                    // Row vanished between find and write
                    Err(e) if e.is_not_found() => {
                        cache
                            .write(CacheMutation::Create(CachedUser::from_record(record)))
                            .await
                    }
                    other => other,
                }
            }
            Err(e) if e.is_not_found() => {
                cache
                    .write(CacheMutation::Create(CachedUser::from_record(record)))
                    .await
            }
            Err(e) => Err(e),
        }
    }
}
