//! Protocol selection
//!
//! Maps the connected server's version onto the presence protocol generation
//! it implements. Thresholds are inclusive lower bounds:
//!
//! | generation  | versions         | fetch | explicit ids | raw presence | status channel |
//! |-------------|------------------|-------|--------------|--------------|----------------|
//! | `Legacy`    | < 1.1.0          | no    | -            | no           | poll resubscribe |
//! | `Broadcast` | [1.1.0, 3.0.0)   | yes   | no           | no           | legacy-notify  |
//! | `OnDemand`  | [3.0.0, 4.1.0)   | yes   | yes          | no           | legacy-notify  |
//! | `Streaming` | >= 4.1.0         | yes   | yes          | yes          | status-notify  |

use serde::Serialize;
use std::fmt;

use crate::value_objects::ServerVersion;

/// First version serving the batched presence endpoint
pub const PRESENCE_ENDPOINT_SINCE: ServerVersion = ServerVersion::new(1, 1, 0);
/// First version that only answers for explicitly requested ids
pub const EXPLICIT_IDS_SINCE: ServerVersion = ServerVersion::new(3, 0, 0);
/// First version with the per-user presence stream
pub const PRESENCE_STREAM_SINCE: ServerVersion = ServerVersion::new(4, 1, 0);

/// Presence protocol generation of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolGeneration {
    /// Version missing or unparseable
    Unknown,
    /// Push-only, kept alive by periodic resubscription
    Legacy,
    /// Endpoint returns every user the server knows about
    Broadcast,
    /// Endpoint answers only for an explicit id list
    OnDemand,
    /// Explicit ids plus a raw presence stream scoped to those ids
    Streaming,
}

impl ProtocolGeneration {
    /// Classify a parsed server version
    #[must_use]
    pub fn classify(version: &ServerVersion) -> Self {
        if version.at_least(&PRESENCE_STREAM_SINCE) {
            Self::Streaming
        } else if version.at_least(&EXPLICIT_IDS_SINCE) {
            Self::OnDemand
        } else if version.at_least(&PRESENCE_ENDPOINT_SINCE) {
            Self::Broadcast
        } else {
            Self::Legacy
        }
    }

    /// Classify a raw version string as reported by the server
    #[must_use]
    pub fn from_version_str(version: Option<&str>) -> Self {
        version
            .and_then(|v| ServerVersion::parse(v).ok())
            .map_or(Self::Unknown, |v| Self::classify(&v))
    }
}

impl fmt::Display for ProtocolGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Legacy => "legacy",
            Self::Broadcast => "broadcast",
            Self::OnDemand => "on_demand",
            Self::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

/// Live-update channel carrying status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusChannel {
    None,
    LegacyNotify,
    StatusNotify,
}

/// How presence must be requested and observed for a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtocolDecision {
    pub generation: ProtocolGeneration,
    /// The batched endpoint exists
    pub fetch_supported: bool,
    /// The request must name the ids it wants
    pub requires_explicit_ids: bool,
    /// Skip the request entirely when no ids are queued
    pub skip_if_no_ids: bool,
    /// Open a raw presence stream for the fetched ids
    pub subscribe_raw_presence: bool,
    /// Keep the legacy channel alive by periodic resubscription
    pub legacy_poll_subscribe: bool,
    pub status_channel: StatusChannel,
}

impl ProtocolDecision {
    /// Decision for a protocol generation
    #[must_use]
    pub const fn for_generation(generation: ProtocolGeneration) -> Self {
        let (fetch, explicit, raw, poll, channel) = match generation {
            ProtocolGeneration::Unknown => (false, false, false, false, StatusChannel::None),
            ProtocolGeneration::Legacy => (false, false, false, true, StatusChannel::None),
            ProtocolGeneration::Broadcast => {
                (true, false, false, false, StatusChannel::LegacyNotify)
            }
            ProtocolGeneration::OnDemand => (true, true, false, false, StatusChannel::LegacyNotify),
            ProtocolGeneration::Streaming => (true, true, true, false, StatusChannel::StatusNotify),
        };

        Self {
            generation,
            fetch_supported: fetch,
            requires_explicit_ids: explicit,
            skip_if_no_ids: explicit,
            subscribe_raw_presence: raw,
            legacy_poll_subscribe: poll,
            status_channel: channel,
        }
    }

    /// Decision for a raw server version string
    #[must_use]
    pub fn for_version(version: Option<&str>) -> Self {
        Self::for_generation(ProtocolGeneration::from_version_str(version))
    }

    /// Whether a batch with `pending` queued ids needs a network call
    #[must_use]
    pub fn should_request(&self, pending: usize) -> bool {
        self.fetch_supported && !(self.skip_if_no_ids && pending == 0)
    }
}
