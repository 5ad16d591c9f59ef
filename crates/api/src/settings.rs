//! Layered service configuration
//!
//! Sources, lowest precedence first:
//! 1. `config/default.{toml,yaml,json}` (optional)
//! 2. the file named by `YOUCARE_CONFIG` (optional)
//! 3. `YOUCARE__SECTION__KEY` environment variables
//! 4. legacy variables `SECRET_KEY`, `BREVO_API_KEY`, `EMAIL_FROM`,
//!    `EMAIL_FROM_NAME` and `DATABASE_URL`

use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use notify::BrevoConfig;
use serde::{Deserialize, Serialize};
use std::env;

use crate::rate_limit::RateLimitConfig;

/// Service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub alerts: AlertConfig,
    pub email: BrevoConfig,
    pub storage: StorageSettings,
    pub rate_limit: RateLimitConfig,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 secret used to verify bearer tokens
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Retention of the in-memory store
    pub max_events: usize,
    /// Events returned by `GET /events`
    pub recent_limit: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            max_events: 100_000,
            recent_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Max level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from files and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name("config/default").required(false));

        if let Ok(path) = env::var("YOUCARE_CONFIG") {
            builder = builder.add_source(File::with_name(&path));
        }

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| url.starts_with("sqlite:"));

        builder
            .add_source(
                Environment::with_prefix("YOUCARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.secret", env::var("SECRET_KEY").ok())?
            .set_override_option("email.api_key", env::var("BREVO_API_KEY").ok())?
            .set_override_option("email.sender_email", env::var("EMAIL_FROM").ok())?
            .set_override_option("email.sender_name", env::var("EMAIL_FROM_NAME").ok())?
            .set_override_option("storage.database_url", database_url)?
            .build()?
            .try_deserialize()
    }
}
