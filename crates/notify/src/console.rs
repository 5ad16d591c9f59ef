//! Log-only transport

use alerting::{NotificationTransport, TransportError};
use async_trait::async_trait;
use tracing::info;

/// Writes alerts to the log instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        info!(recipient, subject, body, "Alert notification (not delivered)");
        Ok(())
    }
}
