//! Presence entities - user status snapshots and their aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::value_objects::UserId;

/// User availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresenceStatus {
    /// User is online and active
    Online,
    /// User is away from keyboard
    Away,
    /// Do not disturb
    Busy,
    /// User is offline (or unknown to the server)
    #[default]
    Offline,
    /// Status value this client does not recognise
    Unknown,
}

impl PresenceStatus {
    /// Decode the numeric status codes used by legacy push payloads
    #[must_use]
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Offline,
            1 => Self::Online,
            2 => Self::Away,
            3 => Self::Busy,
            _ => Self::Unknown,
        }
    }

    /// Wire name of the status
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Busy => "busy",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PresenceStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "online" => Self::Online,
            "away" => Self::Away,
            "busy" => Self::Busy,
            "offline" => Self::Offline,
            _ => Self::Unknown,
        })
    }
}

impl Serialize for PresenceStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// Deserialize from a status name or a legacy numeric code
impl<'de> Deserialize<'de> for PresenceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct StatusVisitor;

        impl Visitor<'_> for StatusVisitor {
            type Value = PresenceStatus;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a status name or numeric status code")
            }

            fn visit_u64<E>(self, value: u64) -> Result<PresenceStatus, E>
            where
                E: de::Error,
            {
                Ok(PresenceStatus::from_code(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<PresenceStatus, E>
            where
                E: de::Error,
            {
                Ok(u64::try_from(value).map_or(PresenceStatus::Unknown, PresenceStatus::from_code))
            }

            fn visit_str<E>(self, value: &str) -> Result<PresenceStatus, E>
            where
                E: de::Error,
            {
                Ok(value.parse().unwrap_or(PresenceStatus::Unknown))
            }

            fn visit_unit<E>(self) -> Result<PresenceStatus, E>
            where
                E: de::Error,
            {
                Ok(PresenceStatus::Offline)
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// Snapshot of one user's presence
///
/// Records are never mutated in place; a newer record supersedes an older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub id: UserId,
    pub status: PresenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
}

impl PresenceRecord {
    /// Create a record without status text
    #[must_use]
    pub fn new(id: UserId, status: PresenceStatus) -> Self {
        Self {
            id,
            status,
            status_text: None,
        }
    }

    /// Record for a user the server did not report
    #[must_use]
    pub fn offline(id: UserId) -> Self {
        Self::new(id, PresenceStatus::Offline)
    }

    /// Set the status text
    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
        self
    }
}

/// Status fields stored per user in the active-users aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub status: PresenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
}

impl From<&PresenceRecord> for ActiveUser {
    fn from(record: &PresenceRecord) -> Self {
        Self {
            status: record.status,
            status_text: record.status_text.clone(),
        }
    }
}

/// Aggregate presence update written to the reactive store in one dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveUsers(BTreeMap<UserId, ActiveUser>);

impl ActiveUsers {
    /// Create an empty aggregate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one user's status
    pub fn insert(&mut self, id: UserId, user: ActiveUser) {
        self.0.insert(id, user);
    }

    /// Look up one user's status
    #[must_use]
    pub fn get(&self, id: &UserId) -> Option<&ActiveUser> {
        self.0.get(id)
    }

    /// Merge another aggregate into this one, newer entries win
    pub fn merge(&mut self, other: ActiveUsers) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &ActiveUser)> {
        self.0.iter()
    }
}

impl<'a> FromIterator<&'a PresenceRecord> for ActiveUsers {
    fn from_iter<I: IntoIterator<Item = &'a PresenceRecord>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|record| (record.id.clone(), ActiveUser::from(record)))
                .collect(),
        )
    }
}

/// User row held by the persistent cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedUser {
    pub id: UserId,
    pub status: PresenceStatus,
    pub status_text: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CachedUser {
    /// Create a cache row from a presence record
    #[must_use]
    pub fn from_record(record: &PresenceRecord) -> Self {
        Self {
            id: record.id.clone(),
            status: record.status,
            status_text: record.status_text.clone(),
            updated_at: Utc::now(),
        }
    }

    /// Overwrite the presence fields with a newer record
    pub fn apply(&mut self, record: &PresenceRecord) {
        self.status = record.status;
        self.status_text.clone_from(&record.status_text);
        self.updated_at = Utc::now();
    }

    /// Check whether the row already reflects `record`
    #[must_use]
    pub fn matches(&self, record: &PresenceRecord) -> bool {
        self.id == record.id && self.status == record.status && self.status_text == record.status_text
    }
}
