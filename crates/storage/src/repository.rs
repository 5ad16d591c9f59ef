//! In-memory Repository Implementation

use crate::{EventStore, StorageError};
use async_trait::async_trait;
use event_intake::NormalizedEvent;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// Default number of events retained
const DEFAULT_MAX_EVENTS: usize = 100_000;

/// In-memory event history with bounded retention
pub struct Repository {
    /// Events, oldest first
    events: Mutex<VecDeque<NormalizedEvent>>,
    /// Max events kept; the oldest are dropped first
    max_events: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_EVENTS)
    }

    /// Create a repository that keeps at most `max_events`
    pub fn with_capacity(max_events: usize) -> Self {
        info!("Creating in-memory repository (max {} events)", max_events);
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(10_000))),
            max_events: max_events.max(1),
        }
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for Repository {
    async fn append(&self, event: &NormalizedEvent) -> Result<(), StorageError> {
        let mut events = self.events.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        // Enforce retention
        while events.len() >= self.max_events {
            events.pop_front();
        }

        events.push_back(event.clone());
        debug!("Stored event for {} ({})", event.subject_id, event.canonical_name);
        Ok(())
    }

    async fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<NormalizedEvent>, StorageError> {
        let events = self.events.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        let mut matching: Vec<_> = events
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.event_time.cmp(&a.event_time));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.events
            .lock()
            .map(|e| e.len())
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
    }
}
