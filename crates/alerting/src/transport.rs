//! Notification transport seam

use crate::error::TransportError;
use async_trait::async_trait;

/// Delivers one rendered alert to one recipient.
///
/// Implementations may be email, push or SMS; the dispatcher only cares
/// whether the send succeeded.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Transport name used in logs
    fn name(&self) -> &str;

    /// Send a message to a single recipient
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), TransportError>;
}
