//! Server version - semantic version reported by the connected backend
//!
//! Servers report versions such as `"4.2.0"`, `"3.0"` or `"6.1.0-rc.2"`.
//! Parsing is lenient: the leading numeric components are read, missing
//! components default to zero, and pre-release or build suffixes are ignored,
//! so comparisons are always major.minor.patch.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// Semantic version of the connected server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerVersion(Version);

impl ServerVersion {
    /// Create a version from its components
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parse a version string leniently
    pub fn parse(s: &str) -> Result<Self, ServerVersionParseError> {
        let trimmed = s.trim().trim_start_matches(['v', 'V']);
        let core = trimmed
            .split(['-', '+', ' '])
            .next()
            .unwrap_or_default();

        // Components past patch are ignored
        let mut parts = [0u64; 3];
        for (slot, piece) in parts.iter_mut().zip(core.split('.')) {
            *slot = piece
                .parse()
                .map_err(|_| ServerVersionParseError::InvalidFormat(s.to_string()))?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Check whether this version is at least `other`
    #[inline]
    pub fn at_least(&self, other: &ServerVersion) -> bool {
        self >= other
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0.major, self.0.minor, self.0.patch).cmp(&(
            other.0.major,
            other.0.minor,
            other.0.patch,
        ))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ServerVersion {
    type Err = ServerVersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServerVersion::parse(s)
    }
}

/// Error when parsing a server version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerVersionParseError {
    #[error("invalid server version: {0:?}")]
    InvalidFormat(String),
}
