//! Notification Transports
//!
//! Implementations of [`alerting::NotificationTransport`]:
//! - Brevo transactional email over HTTPS
//! - Log-only transport for deployments without email credentials
//! - In-memory transport that records messages

mod brevo;
mod console;
mod memory;

pub use brevo::{BrevoConfig, BrevoTransport};
pub use console::LogTransport;
pub use memory::{MemoryTransport, SentMessage};

use alerting::{NotificationTransport, TransportError};
use std::sync::Arc;
use tracing::warn;

/// Pick the transport for a configuration: Brevo when credentials are
/// present, otherwise log-only.
pub fn from_config(config: &BrevoConfig) -> Result<Arc<dyn NotificationTransport>, TransportError> {
    if config.is_configured() {
        Ok(Arc::new(BrevoTransport::new(config.clone())?))
    } else {
        warn!("Brevo API key or sender not configured, alerts will only be logged");
        Ok(Arc::new(LogTransport::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_falls_back_to_log() {
        let transport = from_config(&BrevoConfig::default()).unwrap();
        assert_eq!(transport.name(), "log");
    }

    #[test]
    fn test_configured_uses_brevo() {
        let config = BrevoConfig {
            api_key: Some("key".to_string()),
            sender_email: Some("alerts@youcare.example".to_string()),
            ..Default::default()
        };
        let transport = from_config(&config).unwrap();
        assert_eq!(transport.name(), "brevo");
    }
}
