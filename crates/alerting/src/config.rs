//! Alert configuration

use crate::category::AlertCategory;
use crate::error::AlertError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Cooldown between inactivity alerts (seconds)
    pub inactivity_cooldown_secs: u64,

    /// Cooldown between door-left-open alerts (seconds)
    pub door_cooldown_secs: u64,

    /// Cooldown between bathroom activity alerts (seconds)
    pub bathroom_cooldown_secs: u64,

    /// IANA zone used for times shown in messages
    pub timezone: String,

    /// Product name used by the fallback template
    pub brand: String,

    /// How long a dispatch waits for outstanding sends (seconds)
    pub dispatch_timeout_secs: u64,

    /// Interval between sweeps of inert cooldown entries (seconds)
    pub sweep_interval_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            inactivity_cooldown_secs: 30 * 60,
            door_cooldown_secs: 15 * 60,
            bathroom_cooldown_secs: 12 * 60,
            timezone: "Asia/Kolkata".to_string(),
            brand: "YouCare".to_string(),
            dispatch_timeout_secs: 10,
            sweep_interval_secs: 300,
        }
    }
}

impl AlertConfig {
    /// Cooldown for a category. Emergency and unrecognized alerts are
    /// always zero, whatever the configuration says.
    pub fn cooldown_for(&self, category: AlertCategory) -> Duration {
        let secs = match category {
            AlertCategory::Inactivity => self.inactivity_cooldown_secs,
            AlertCategory::Door => self.door_cooldown_secs,
            AlertCategory::Bathroom => self.bathroom_cooldown_secs,
            AlertCategory::Sos | AlertCategory::Panic | AlertCategory::Other => 0,
        };
        Duration::from_secs(secs)
    }

    /// Largest configured cooldown; entries older than this are inert
    pub fn max_cooldown(&self) -> Duration {
        Duration::from_secs(
            self.inactivity_cooldown_secs
                .max(self.door_cooldown_secs)
                .max(self.bathroom_cooldown_secs),
        )
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Parse the presentation time zone
    pub fn tz(&self) -> Result<Tz, AlertError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AlertError::Config(format!("timezone {:?}: {}", self.timezone, e)))
    }
}
