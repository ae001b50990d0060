//! Live-update subscriptions
//!
//! Opened on every (re)connect. The version-gated status channel comes from
//! the protocol decision; avatar and name changes are always subscribed.
//! Servers older than 1.1.0 only push presence while the legacy
//! `activeUsers` stream is periodically re-subscribed.

use presence_core::ProtocolDecision;
use presence_core::StatusChannel;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::context::ServiceContext;

/// Stream carrying logged-in user notifications
pub const STREAM_NOTIFY_LOGGED: &str = "stream-notify-logged";
/// Per-user presence stream, opened for fetched ids on streaming servers
pub const USER_PRESENCE_STREAM: &str = "stream-user-presence";
/// Legacy presence stream of pre-1.1.0 servers
pub const ACTIVE_USERS_CHANNEL: &str = "activeUsers";

/// A named stream registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    /// Legacy whole-server presence stream
    ActiveUsers,
    /// Status change notifications
    UserStatus,
    /// Avatar change notifications
    AvatarChanged,
    /// Display name change notifications
    NameChanged,
}

impl Subscription {
    /// Stream name
    #[must_use]
    pub fn channel(&self) -> &'static str {
        match self {
            Self::ActiveUsers => ACTIVE_USERS_CHANNEL,
            Self::UserStatus | Self::AvatarChanged | Self::NameChanged => STREAM_NOTIFY_LOGGED,
        }
    }

    /// Event name within the stream
    #[must_use]
    pub fn event(&self) -> Option<&'static str> {
        match self {
            Self::ActiveUsers => None,
            Self::UserStatus => Some("user-status"),
            Self::AvatarChanged => Some("updateAvatar"),
            Self::NameChanged => Some("Users:NameChanged"),
        }
    }

    /// Arguments passed to the transport
    #[must_use]
    pub fn args(&self) -> Vec<Value> {
        self.event()
            .map(|event| vec![Value::String(event.to_string())])
            .unwrap_or_default()
    }

    /// Streams to open at connect time for a protocol decision
    #[must_use]
    pub fn for_decision(decision: &ProtocolDecision) -> Vec<Self> {
        let mut subscriptions = Vec::with_capacity(3);

        match decision.status_channel {
            StatusChannel::LegacyNotify => subscriptions.push(Self::UserStatus),
            // Delivered by the raw presence stream the fetcher opens
            StatusChannel::StatusNotify | StatusChannel::None => {}
        }

        subscriptions.push(Self::AvatarChanged);
        subscriptions.push(Self::NameChanged);
        subscriptions
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event() {
            Some(event) => write!(f, "{}/{event}", self.channel()),
            None => f.write_str(self.channel()),
        }
    }
}

/// Opens connect-time subscriptions and owns the legacy resubscribe timer
pub struct SubscriptionManager {
    ctx: ServiceContext,
    legacy_poll: Option<JoinHandle<()>>,
}

impl SubscriptionManager {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            legacy_poll: None,
        }
    }

    /// Subscribe to every stream the server version calls for
    ///
    /// Any previously installed legacy timer is cancelled first, so calling
    /// this on every reconnect never stacks timers.
    #[instrument(skip(self))]
    pub async fn establish(&mut self, server_version: Option<&str>) -> Vec<Subscription> {
        self.cancel();

        let decision = ProtocolDecision::for_version(server_version);
        if decision.legacy_poll_subscribe {
            self.install_legacy_poll();
        }

        let mut opened = Vec::new();
        for subscription in Subscription::for_decision(&decision) {
            match self
                .ctx
                .transport()
                .subscribe(subscription.channel(), &subscription.args())
                .await
            {
                Ok(()) => opened.push(subscription),
                Err(e) => {
                    warn!(subscription = %subscription, error = %e, "Failed to subscribe");
                }
            }
        }

        info!(
            generation = %decision.generation,
            subscriptions = opened.len(),
            legacy_poll = decision.legacy_poll_subscribe,
            "Presence subscriptions established"
        );

        opened
    }

    fn install_legacy_poll(&mut self) {
        let transport = Arc::clone(self.ctx.transport());
        let interval = self.ctx.config().legacy_resubscribe_interval();
        let subscription = Subscription::ActiveUsers;

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match transport
                    .subscribe(subscription.channel(), &subscription.args())
                    .await
                {
                    Ok(()) => debug!("Legacy presence stream re-subscribed"),
                    Err(e) => warn!(error = %e, "Legacy presence resubscribe failed"),
                }
            }
        });

        self.legacy_poll = Some(handle);
    }

    /// Stop the legacy resubscribe timer
    pub fn cancel(&mut self) {
        if let Some(handle) = self.legacy_poll.take() {
            handle.abort();
            debug!("Legacy presence resubscribe cancelled");
        }
    }

    #[must_use]
    pub fn has_legacy_poll(&self) -> bool {
        self.legacy_poll.is_some()
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.cancel();
    }
}
