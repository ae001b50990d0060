//! User ID - opaque server-assigned user identifier
//!
//! Used as the batching key for presence requests. The backend treats the
//! value as an opaque string, so no structure is assumed here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user ID, rejecting empty values
    pub fn parse(s: impl Into<String>) -> Result<Self, UserIdParseError> {
        let raw = s.into();
        if raw.trim().is_empty() {
            return Err(UserIdParseError::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join ids into the comma separated form the presence endpoint expects
    pub fn join<'a>(ids: impl IntoIterator<Item = &'a UserId>) -> String {
        ids.into_iter()
            .map(UserId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Error when constructing a [`UserId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserIdParseError {
    #[error("user id must not be empty")]
    Empty,
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for UserId {
    type Err = UserIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserId::parse(s)
    }
}

impl TryFrom<&str> for UserId {
    type Error = UserIdParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        UserId::parse(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        UserId::parse(s)
    }
}
