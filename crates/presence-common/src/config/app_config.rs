//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub presence: PresenceConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: default_env(),
        }
    }
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Presence aggregation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceConfig {
    /// Batch window, measured from the first request after idle
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Period of the legacy channel resubscription
    #[serde(default = "default_legacy_resubscribe_ms")]
    pub legacy_resubscribe_ms: u64,
    /// REST endpoint answering batched presence queries
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            legacy_resubscribe_ms: default_legacy_resubscribe_ms(),
            endpoint: default_endpoint(),
        }
    }
}

impl PresenceConfig {
    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn legacy_resubscribe_interval(&self) -> Duration {
        Duration::from_millis(self.legacy_resubscribe_ms)
    }
}

// Default value functions
fn default_app_name() -> String {
    "presence-client".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_legacy_resubscribe_ms() -> u64 {
    5000
}

fn default_endpoint() -> String {
    "users.presence".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: match lookup("APP_ENV") {
                    Some(raw) => Environment::parse(&raw)
                        .ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
                    None => default_env(),
                },
            },
            presence: PresenceConfig {
                debounce_ms: parse_millis(&lookup, "PRESENCE_DEBOUNCE_MS")?
                    .unwrap_or_else(default_debounce_ms),
                legacy_resubscribe_ms: parse_millis(&lookup, "PRESENCE_LEGACY_RESUBSCRIBE_MS")?
                    .unwrap_or_else(default_legacy_resubscribe_ms),
                endpoint: lookup("PRESENCE_ENDPOINT")
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(default_endpoint),
            },
        })
    }
}

fn parse_millis<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidValue(key, raw)),
            Ok(ms) => Ok(Some(ms)),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
