//! Alerting System
//!
//! Decides whether a caregiver alert should go out and fans it out to every
//! recipient:
//! - per (subject, category) cooldown deduplication
//! - emergency (SOS / panic) alerts are never suppressed
//! - per-category message templates
//! - isolated per-recipient delivery with an overall deadline

mod category;
mod config;
mod cooldown;
mod dispatch;
mod error;
mod message;
mod policy;
mod transport;

pub use category::AlertCategory;
pub use config::AlertConfig;
pub use cooldown::{spawn_sweeper, Admission, CooldownKey, CooldownStore};
pub use dispatch::{
    AlertDispatcher, Delivery, DispatchResult, DispatchStatus, NotificationRequest,
};
pub use error::{AlertError, TransportError};
pub use message::{render, Metadata, RenderedAlert};
pub use policy::{AlertPolicy, Decision, Timestamp};
pub use transport::NotificationTransport;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated principal on whose behalf an alert is raised
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
