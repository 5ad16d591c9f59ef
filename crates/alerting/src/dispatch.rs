//! Alert Dispatch Coordinator

use crate::category::AlertCategory;
use crate::error::{AlertError, TransportError};
use crate::message::{Metadata, RenderedAlert};
use crate::policy::{AlertPolicy, Decision, Timestamp};
use crate::transport::NotificationTransport;
use crate::SubjectId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Alert to be dispatched
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub subject: SubjectId,
    pub category: AlertCategory,
    /// Recipient addresses; duplicates are sent to twice
    pub recipients: Vec<String>,
    pub metadata: Metadata,
}

/// Whether the alert went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Suppressed,
}

/// Outcome for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub recipient: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated outcome of a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub status: DispatchStatus,
    pub dispatch_id: Option<Uuid>,
    pub deliveries: Vec<Delivery>,
    pub attempted: usize,
    pub succeeded: usize,
}

impl DispatchResult {
    fn suppressed() -> Self {
        Self {
            status: DispatchStatus::Suppressed,
            dispatch_id: None,
            deliveries: Vec::new(),
            attempted: 0,
            succeeded: 0,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.status == DispatchStatus::Suppressed
    }

    /// Some recipients did not get the alert
    pub fn is_partial(&self) -> bool {
        self.succeeded < self.attempted
    }
}

/// Validates alert requests, consults the policy and fans out to recipients
pub struct AlertDispatcher {
    policy: AlertPolicy,
    transport: Arc<dyn NotificationTransport>,
    deadline: Duration,
}

impl AlertDispatcher {
    /// Create a dispatcher; the deadline comes from the policy's config
    pub fn new(policy: AlertPolicy, transport: Arc<dyn NotificationTransport>) -> Self {
        let deadline = policy.config().dispatch_timeout();
        Self {
            policy,
            transport,
            deadline,
        }
    }

    /// Override how long to wait for outstanding sends
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Dispatch an alert now
    pub async fn dispatch(&self, request: NotificationRequest) -> Result<DispatchResult, AlertError> {
        self.dispatch_at(request, Timestamp::now()).await
    }

    /// Dispatch an alert as of `now`
    pub async fn dispatch_at(
        &self,
        request: NotificationRequest,
        now: Timestamp,
    ) -> Result<DispatchResult, AlertError> {
        validate_recipients(&request.recipients)?;

        let message = match self
            .policy
            .decide(&request.subject, request.category, &request.metadata, now)
        {
            Decision::Suppressed { .. } => {
                metrics::counter!("alerts_suppressed_total", "category" => request.category.as_str())
                    .increment(1);
                return Ok(DispatchResult::suppressed());
            }
            Decision::Admitted(message) => message,
        };
        metrics::counter!("alerts_admitted_total", "category" => request.category.as_str())
            .increment(1);

        let dispatch_id = Uuid::new_v4();
        let deliveries = self.fan_out(&request.recipients, message).await;
        let succeeded = deliveries.iter().filter(|d| d.delivered).count();

        metrics::counter!("notifications_sent_total").increment(succeeded as u64);
        metrics::counter!("notifications_failed_total")
            .increment((deliveries.len() - succeeded) as u64);
        info!(
            "Alert {} ({}) for {}: {}/{} notifications sent via {}",
            dispatch_id,
            request.category,
            request.subject,
            succeeded,
            deliveries.len(),
            self.transport.name()
        );

        Ok(DispatchResult {
            status: DispatchStatus::Sent,
            dispatch_id: Some(dispatch_id),
            attempted: deliveries.len(),
            succeeded,
            deliveries,
        })
    }

    /// Send to every recipient concurrently, waiting at most the deadline
    async fn fan_out(&self, recipients: &[String], message: RenderedAlert) -> Vec<Delivery> {
        let message = Arc::new(message);
        let mut outcomes: Vec<Option<Result<(), TransportError>>> = vec![None; recipients.len()];
        let mut tasks = JoinSet::new();

        for (index, recipient) in recipients.iter().enumerate() {
            let transport = Arc::clone(&self.transport);
            let message = Arc::clone(&message);
            let recipient = recipient.clone();
            tasks.spawn(async move {
                let send = tokio::spawn(async move {
                    transport.send(&recipient, &message.subject, &message.body).await
                });
                let _guard = AbortOnDrop(send.abort_handle());
                let outcome = match send.await {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_panic() => Err(TransportError::TaskFailed("panicked".to_string())),
                    Err(_) => Err(TransportError::TaskFailed("cancelled".to_string())),
                };
                (index, outcome)
            });
        }

        // No deadline when the configured timeout overflows the clock
        let deadline = tokio::time::Instant::now().checked_add(self.deadline);
        loop {
            let next = match deadline {
                Some(at) => tokio::time::timeout_at(at, tasks.join_next()).await,
                None => Ok(tasks.join_next().await),
            };
            match next {
                Ok(Some(Ok((index, outcome)))) => outcomes[index] = Some(outcome),
                Ok(Some(Err(e))) => warn!("Notification task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Dispatch deadline of {}ms reached with {} sends outstanding",
                        self.deadline.as_millis(),
                        tasks.len()
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        recipients
            .iter()
            .zip(outcomes)
            .map(|(recipient, outcome)| {
                let outcome = outcome.unwrap_or(Err(TransportError::TimedOut));
                match outcome {
                    Ok(()) => {
                        debug!("Notification sent to {}", recipient);
                        Delivery {
                            recipient: recipient.clone(),
                            delivered: true,
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!("Notification to {} failed: {}", recipient, e);
                        Delivery {
                            recipient: recipient.clone(),
                            delivered: false,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect()
    }
}

/// Aborts the inner send when its supervising task is dropped or aborted
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn validate_recipients(recipients: &[String]) -> Result<(), AlertError> {
    if recipients.is_empty() {
        return Err(AlertError::InvalidRequest("Recipients list required".to_string()));
    }
    match recipients.iter().find(|r| !is_address(r)) {
        Some(bad) => Err(AlertError::InvalidRequest(format!("Invalid recipient address: {:?}", bad))),
        None => Ok(()),
    }
}

fn is_address(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }
    match candidate.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertConfig;
    use crate::cooldown::CooldownStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records sends; fails, hangs or panics for listed recipients
    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<(String, String)>>,
        failing: Vec<String>,
        hanging: Vec<String>,
        panicking: Vec<String>,
    }

    impl MockTransport {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationTransport for MockTransport {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), TransportError> {
            if self.hanging.iter().any(|r| r == recipient) {
                std::future::pending::<()>().await;
            }
            if self.panicking.iter().any(|r| r == recipient) {
                panic!("transport bug for {}", recipient);
            }
            if self.failing.iter().any(|r| r == recipient) {
                return Err(TransportError::Unavailable("connection refused".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn dispatcher(transport: Arc<MockTransport>) -> AlertDispatcher {
        let policy = AlertPolicy::new(AlertConfig::default(), Arc::new(CooldownStore::new())).unwrap();
        AlertDispatcher::new(policy, transport)
    }

    fn request(category: AlertCategory, recipients: &[&str]) -> NotificationRequest {
        NotificationRequest {
            subject: SubjectId::from(1_i64),
            category,
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn test_partial_failure_is_aggregated() {
        let transport = Arc::new(MockTransport {
            failing: vec!["b@x.com".to_string()],
            ..Default::default()
        });
        let dispatcher = dispatcher(Arc::clone(&transport));

        let result = dispatcher
            .dispatch(request(AlertCategory::Door, &["a@x.com", "b@x.com"]))
            .await
            .unwrap();

        assert_eq!(result.status, DispatchStatus::Sent);
        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert!(result.is_partial());
        assert!(result.deliveries[0].delivered);
        assert!(!result.deliveries[1].delivered);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_is_suppressed_not_failed() {
        let transport = Arc::new(MockTransport::default());
        let dispatcher = dispatcher(Arc::clone(&transport));
        let now = Timestamp::now();

        let first = dispatcher
            .dispatch_at(request(AlertCategory::Inactivity, &["a@x.com"]), now)
            .await
            .unwrap();
        assert_eq!(first.succeeded, 1);

        let second = dispatcher
            .dispatch_at(
                request(AlertCategory::Inactivity, &["a@x.com"]),
                now.after(Duration::from_secs(30)),
            )
            .await
            .unwrap();
        assert!(second.is_suppressed());
        assert_eq!(second.attempted, 0);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_sos_burst_all_dispatched() {
        let transport = Arc::new(MockTransport::default());
        let dispatcher = dispatcher(Arc::clone(&transport));
        let now = Timestamp::now();

        for i in 0..5 {
            let result = dispatcher
                .dispatch_at(request(AlertCategory::Sos, &["a@x.com"]), now.after(Duration::from_secs(i)))
                .await
                .unwrap();
            assert_eq!(result.status, DispatchStatus::Sent);
        }
        assert_eq!(transport.sent().len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_recipients_rejected() {
        let dispatcher = dispatcher(Arc::new(MockTransport::default()));

        let err = dispatcher.dispatch(request(AlertCategory::Door, &[])).await.unwrap_err();
        assert!(matches!(err, AlertError::InvalidRequest(_)));

        let err = dispatcher
            .dispatch(request(AlertCategory::Door, &["a@x.com", "not an address"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AlertError::InvalidRequest(_)));

        // Rejected requests leave the cooldown untouched
        let ok = dispatcher
            .dispatch(request(AlertCategory::Door, &["a@x.com"]))
            .await
            .unwrap();
        assert_eq!(ok.status, DispatchStatus::Sent);
    }

    #[tokio::test]
    async fn test_concurrent_requests_admit_one() {
        let transport = Arc::new(MockTransport::default());
        let dispatcher = Arc::new(dispatcher(Arc::clone(&transport)));

        let mut tasks = JoinSet::new();
        for _ in 0..100 {
            let dispatcher = Arc::clone(&dispatcher);
            tasks.spawn(async move {
                dispatcher
                    .dispatch(request(AlertCategory::Bathroom, &["a@x.com"]))
                    .await
                    .unwrap()
            });
        }

        let mut sent = 0;
        let mut suppressed = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap().status {
                DispatchStatus::Sent => sent += 1,
                DispatchStatus::Suppressed => suppressed += 1,
            }
        }
        assert_eq!(sent, 1);
        assert_eq!(suppressed, 99);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reports_partial_result() {
        let transport = Arc::new(MockTransport {
            hanging: vec!["slow@x.com".to_string()],
            ..Default::default()
        });
        let dispatcher = dispatcher(Arc::clone(&transport)).with_deadline(Duration::from_secs(2));

        let result = dispatcher
            .dispatch(request(AlertCategory::Sos, &["slow@x.com", "fast@x.com"]))
            .await
            .unwrap();

        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.deliveries[0].error.as_deref(), Some("Timed out"));
        assert!(result.deliveries[1].delivered);
    }

    #[tokio::test]
    async fn test_panicking_send_reported_against_its_recipient() {
        let transport = Arc::new(MockTransport {
            panicking: vec!["bad@x.com".to_string()],
            ..Default::default()
        });
        let dispatcher = dispatcher(Arc::clone(&transport));

        let result = dispatcher
            .dispatch(request(AlertCategory::Sos, &["ok@x.com", "bad@x.com"]))
            .await
            .unwrap();

        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert!(result.deliveries[0].delivered);
        assert_eq!(result.deliveries[1].recipient, "bad@x.com");
        assert_eq!(
            result.deliveries[1].error.as_deref(),
            Some("Send task failed: panicked")
        );
    }

    #[tokio::test]
    async fn test_unbounded_deadline_does_not_overflow() {
        let transport = Arc::new(MockTransport::default());
        let dispatcher =
            dispatcher(Arc::clone(&transport)).with_deadline(Duration::from_secs(u64::MAX));

        let result = dispatcher
            .dispatch(request(AlertCategory::Door, &["a@x.com"]))
            .await
            .unwrap();

        assert_eq!(result.succeeded, 1);
    }

    #[test]
    fn test_address_shape() {
        assert!(is_address("a@x.com"));
        assert!(is_address("first.last@care.example.org"));
        assert!(!is_address("a@x"));
        assert!(!is_address("@x.com"));
        assert!(!is_address("a@@x.com"));
        assert!(!is_address("a@x.com."));
        assert!(!is_address("a b@x.com"));
    }
}
