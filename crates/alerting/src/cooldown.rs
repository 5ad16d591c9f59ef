//! Cooldown Store Implementation

use crate::category::AlertCategory;
use crate::SubjectId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Identifies one cooldown timer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub subject: SubjectId,
    pub category: AlertCategory,
}

impl CooldownKey {
    pub fn new(subject: SubjectId, category: AlertCategory) -> Self {
        Self { subject, category }
    }
}

/// Outcome of a cooldown check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Alert may go out; `now` has been recorded
    Admitted,
    /// Alert falls inside the cooldown window
    Suppressed {
        /// Time since the last admitted alert
        elapsed: Duration,
        /// Time left until the window closes
        remaining: Duration,
    },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Last-sent instants keyed by (subject, category).
///
/// Check-and-record happens under a single lock so concurrent callers can
/// never both be admitted for the same key inside one window.
#[derive(Debug, Default)]
pub struct CooldownStore {
    last_sent: Mutex<HashMap<CooldownKey, Instant>>,
}

impl CooldownStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CooldownKey, Instant>> {
        // The map is consistent between statements, so a poisoned lock is safe to reuse.
        self.last_sent.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decide whether an alert for `key` may go out at `now`, recording `now`
    /// when it does.
    pub fn check(&self, key: &CooldownKey, now: Instant, cooldown: Duration) -> Admission {
        let mut entries = self.entries();

        if cooldown.is_zero() {
            entries.insert(key.clone(), now);
            return Admission::Admitted;
        }

        if let Some(last) = entries.get(key) {
            // Out-of-order arrivals (now before last) count as no time elapsed
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < cooldown {
                debug!(
                    "Cooldown hit for {}:{} ({}s since last)",
                    key.subject,
                    key.category,
                    elapsed.as_secs()
                );
                return Admission::Suppressed {
                    elapsed,
                    remaining: cooldown - elapsed,
                };
            }
        }

        entries.insert(key.clone(), now);
        Admission::Admitted
    }

    /// Boolean form of [`check`](Self::check)
    pub fn should_admit(&self, key: &CooldownKey, now: Instant, cooldown: Duration) -> bool {
        self.check(key, now, cooldown).is_admitted()
    }

    /// Last admitted instant for a key
    pub fn last_sent(&self, key: &CooldownKey) -> Option<Instant> {
        self.entries().get(key).copied()
    }

    /// Drop entries whose last alert is at least `max_age` old. Such entries
    /// can no longer suppress anything. Returns the number removed.
    pub fn sweep(&self, now: Instant, max_age: Duration) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, last| now.saturating_duration_since(*last) < max_age);
        before - entries.len()
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cooldown state
    pub fn clear(&self) {
        self.entries().clear();
    }
}

/// Periodically evict inert cooldown entries
pub fn spawn_sweeper(store: Arc<CooldownStore>, every: Duration, max_age: Duration) -> JoinHandle<()> {
    info!(
        "Starting cooldown sweeper: every {}s, max age {}s",
        every.as_secs(),
        max_age.as_secs()
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = store.sweep(Instant::now(), max_age);
            if removed > 0 {
                debug!("Swept {} inert cooldown entries ({} left)", removed, store.len());
            }
        }
    })
}
