//! Response bodies returned by the presence endpoint

use presence_core::{PresenceRecord, PresenceStatus, UserId};
use serde::Deserialize;

/// Body of a `users.presence` call
#[derive(Debug, Clone, Deserialize)]
pub struct UsersPresenceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub users: Vec<PresenceUserDto>,
}

/// One user entry of the presence response
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceUserDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub status: PresenceStatus,
    #[serde(default, rename = "statusText")]
    pub status_text: Option<String>,
}

impl PresenceUserDto {
    /// Convert into a domain record; entries without a usable id are dropped
    pub fn into_record(self) -> Option<PresenceRecord> {
        let id = UserId::parse(self.id).ok()?;

        Some(PresenceRecord {
            id,
            status: self.status,
            status_text: self.status_text,
        })
    }
}
