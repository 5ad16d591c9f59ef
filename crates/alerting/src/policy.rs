//! Alert Policy

use crate::category::AlertCategory;
use crate::config::AlertConfig;
use crate::cooldown::{Admission, CooldownKey, CooldownStore};
use crate::error::AlertError;
use crate::message::{render, Metadata, RenderedAlert};
use crate::SubjectId;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A point in time seen two ways: monotonic for cooldown arithmetic, wall
/// clock for what the recipient reads.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    pub monotonic: Instant,
    pub wall: DateTime<Utc>,
}

impl Timestamp {
    pub fn now() -> Self {
        Self {
            monotonic: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// Same wall time shifted forward on the monotonic clock
    pub fn after(&self, offset: Duration) -> Self {
        Self {
            monotonic: self.monotonic + offset,
            wall: self.wall + chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero()),
        }
    }
}

/// Result of consulting the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Inside the cooldown window; nothing was rendered
    Suppressed { elapsed: Duration, remaining: Duration },
    /// Alert goes out with this message
    Admitted(RenderedAlert),
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted(_))
    }
}

/// Gates alerts through the cooldown store and renders admitted ones
pub struct AlertPolicy {
    config: AlertConfig,
    tz: Tz,
    store: Arc<CooldownStore>,
}

impl AlertPolicy {
    /// Create a policy over an injected cooldown store
    pub fn new(config: AlertConfig, store: Arc<CooldownStore>) -> Result<Self, AlertError> {
        let tz = config.tz()?;
        info!("Creating alert policy with config: {:?}", config);
        Ok(Self { config, tz, store })
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CooldownStore> {
        &self.store
    }

    /// Decide whether an alert goes out, rendering it if so
    pub fn decide(
        &self,
        subject: &SubjectId,
        category: AlertCategory,
        metadata: &Metadata,
        now: Timestamp,
    ) -> Decision {
        let cooldown = self.config.cooldown_for(category);
        let key = CooldownKey::new(subject.clone(), category);

        match self.store.check(&key, now.monotonic, cooldown) {
            Admission::Suppressed { elapsed, remaining } => {
                info!(
                    "Skipping duplicate {} alert for {} ({}s since last, {}s remaining)",
                    category,
                    subject,
                    elapsed.as_secs(),
                    remaining.as_secs()
                );
                Decision::Suppressed { elapsed, remaining }
            }
            Admission::Admitted => {
                debug!("Admitted {} alert for {}", category, subject);
                let local = now.wall.with_timezone(&self.tz);
                Decision::Admitted(render(category, metadata, &local, &self.config.brand))
            }
        }
    }
}
