//! Presence fetcher
//!
//! Performs one batched presence request per fire, shaped by the protocol
//! generation of the connected server, and normalizes the answer into a
//! mapping with an entry for every requested id. Users the server volunteers
//! beyond that set are kept apart.

use presence_core::{PresenceRecord, ProtocolDecision, RequestParams, UserId};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use crate::dto::UsersPresenceResponse;

use super::context::ServiceContext;
use super::error::{FetchError, FetchResult};
use super::subscriptions::USER_PRESENCE_STREAM;

/// Normalized fetch result keyed by user
pub type PresenceMap = BTreeMap<UserId, PresenceRecord>;

/// Query parameter carrying the comma separated id list
pub const IDS_PARAM: &str = "ids";

/// Normalized answer to one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPresence {
    /// One record per requested id
    pub requested: PresenceMap,
    /// Users the server returned without being asked
    pub unrequested: Vec<PresenceRecord>,
}

impl FetchedPresence {
    /// Wrap a single record pushed for a known user
    #[must_use]
    pub fn from_record(record: PresenceRecord) -> Self {
        Self {
            requested: PresenceMap::from([(record.id.clone(), record)]),
            unrequested: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requested.is_empty() && self.unrequested.is_empty()
    }

    /// Every record, requested ids first
    pub fn records(&self) -> impl Iterator<Item = &PresenceRecord> {
        self.requested.values().chain(self.unrequested.iter())
    }
}

/// Presence fetcher
pub struct PresenceFetcher<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PresenceFetcher<'a> {
    /// Create a new PresenceFetcher
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fetch presence for `pending`
    ///
    /// Returns an empty result without any network call when the server
    /// predates the presence endpoint, or when it needs explicit ids and none
    /// are queued.
    #[instrument(skip(self, pending), fields(pending = pending.len()))]
    pub async fn fetch(
        &self,
        server_version: Option<&str>,
        pending: &[UserId],
    ) -> FetchResult<FetchedPresence> {
        let decision = ProtocolDecision::for_version(server_version);

        if !decision.fetch_supported {
            debug!(generation = %decision.generation, "Presence is push-only, skipping fetch");
            return Ok(FetchedPresence::default());
        }

        if !decision.should_request(pending.len()) {
            debug!("No ids queued, skipping fetch");
            return Ok(FetchedPresence::default());
        }

        let params = Self::build_params(&decision, pending);
        let body = self
            .ctx
            .transport()
            .get(&self.ctx.config().endpoint, &params)
            .await?;

        let response: UsersPresenceResponse = serde_json::from_value(body)?;
        if !response.success {
            return Err(FetchError::Rejected);
        }

        if decision.subscribe_raw_presence {
            self.subscribe_presence_stream(pending).await;
        }

        let returned = response.users.len();
        let presences = Self::normalize(response, pending);

        debug!(
            generation = %decision.generation,
            returned,
            resolved = presences.requested.len(),
            unrequested = presences.unrequested.len(),
            "Presence fetched"
        );

        Ok(presences)
    }

    /// Request parameters for a batch
    #[must_use]
    pub fn build_params(decision: &ProtocolDecision, pending: &[UserId]) -> RequestParams {
        let mut params = RequestParams::new();
        if decision.requires_explicit_ids {
            params.insert(IDS_PARAM.to_string(), UserId::join(pending));
        }
        params
    }

    /// Key returned users by id and mark requested-but-missing ids offline
    fn normalize(response: UsersPresenceResponse, pending: &[UserId]) -> FetchedPresence {
        let mut returned: PresenceMap = response
            .users
            .into_iter()
            .filter_map(|user| user.into_record())
            .map(|record| (record.id.clone(), record))
            .collect();

        let requested = pending
            .iter()
            .map(|id| {
                let record = returned
                    .remove(id)
                    .unwrap_or_else(|| PresenceRecord::offline(id.clone()));
                (id.clone(), record)
            })
            .collect();

        FetchedPresence {
            requested,
            unrequested: returned.into_values().collect(),
        }
    }

    /// Open the raw per-user presence stream for exactly the fetched ids
    async fn subscribe_presence_stream(&self, ids: &[UserId]) {
        let payload = json!(["", { "added": ids }]);

        if let Err(e) = self
            .ctx
            .transport()
            .subscribe_raw(USER_PRESENCE_STREAM, payload)
            .await
        {
            warn!(error = %e, ids = ids.len(), "Failed to open presence stream");
        }
    }
}
