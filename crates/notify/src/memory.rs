//! In-memory transport

use alerting::{NotificationTransport, TransportError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// A message captured by [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Records every message; recipients marked failing are refused.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse all future sends to `recipient`
    pub fn fail_for(&self, recipient: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(recipient.into());
        }
    }

    /// Messages delivered so far
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

#[async_trait]
impl NotificationTransport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let refused = self
            .failing
            .lock()
            .map(|f| f.contains(recipient))
            .unwrap_or(false);
        if refused {
            return Err(TransportError::Unavailable(format!("{} refused", recipient)));
        }

        let mut sent = self
            .sent
            .lock()
            .map_err(|e| TransportError::Unavailable(format!("Lock error: {}", e)))?;
        sent.push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_refuses() {
        let transport = MemoryTransport::new();
        transport.fail_for("b@x.com");

        transport.send("a@x.com", "s", "b").await.unwrap();
        assert!(transport.send("b@x.com", "s", "b").await.is_err());

        let sent = transport.clone().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "a@x.com");

        transport.clear();
        assert!(transport.sent().is_empty());
    }
}
