//! Brevo transactional email transport

use alerting::{NotificationTransport, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Brevo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrevoConfig {
    /// SMTP API endpoint
    pub endpoint: String,
    /// API key (`BREVO_API_KEY`)
    pub api_key: Option<String>,
    /// Sender address (`EMAIL_FROM`)
    pub sender_email: Option<String>,
    /// Sender display name (`EMAIL_FROM_NAME`)
    pub sender_name: Option<String>,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for BrevoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.brevo.com/v3/smtp/email".to_string(),
            api_key: None,
            sender_email: None,
            sender_name: None,
            timeout_secs: 10,
        }
    }
}

impl BrevoConfig {
    /// Whether enough is set to send mail
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.sender_email.as_deref().is_some_and(|e| !e.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailPayload<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: String,
}

/// Sends alerts as Brevo transactional emails
pub struct BrevoTransport {
    config: BrevoConfig,
    client: reqwest::Client,
}

impl BrevoTransport {
    /// Create a new transport
    pub fn new(config: BrevoConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        info!("Brevo transport configured for {}", config.endpoint);
        Ok(Self { config, client })
    }
}

/// Wrap a plain-text body in the HTML envelope Brevo expects
pub(crate) fn html_body(body: &str) -> String {
    let escaped = body
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', "<br>");
    format!("<html><body><p>{}</p></body></html>", escaped)
}

#[async_trait]
impl NotificationTransport for BrevoTransport {
    fn name(&self) -> &str {
        "brevo"
    }

    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let payload = EmailPayload {
            sender: Contact {
                email: self.config.sender_email.as_deref().unwrap_or_default(),
                name: self.config.sender_name.as_deref(),
            },
            to: vec![Contact {
                email: recipient,
                name: None,
            }],
            subject,
            html_content: html_body(body),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("accept", "application/json")
            .header("api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Email request to {} failed: {}", recipient, e);
                TransportError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 201 {
            info!("Brevo email sent to {}", recipient);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!("Brevo error {} for {}: {}", status, recipient, body);
        Err(TransportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_body() {
        assert_eq!(
            html_body("Bathroom visits today: 9\nThreshold: 6"),
            "<html><body><p>Bathroom visits today: 9<br>Threshold: 6</p></body></html>"
        );
        assert_eq!(
            html_body("<b>&"),
            "<html><body><p>&lt;b&gt;&amp;</p></body></html>"
        );
    }

    #[test]
    fn test_payload_shape() {
        let payload = EmailPayload {
            sender: Contact {
                email: "alerts@youcare.example",
                name: Some("YouCare"),
            },
            to: vec![Contact {
                email: "a@x.com",
                name: None,
            }],
            subject: "🚪 Door Left Open Alert (03:15 PM)",
            html_content: html_body("Door has been open for 5 minutes."),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["sender"]["name"], "YouCare");
        assert_eq!(json["to"][0]["email"], "a@x.com");
        assert!(json["to"][0].get("name").is_none());
        assert!(json["htmlContent"].as_str().unwrap().contains("5 minutes"));
    }

    #[test]
    fn test_is_configured() {
        assert!(!BrevoConfig::default().is_configured());
        let config = BrevoConfig {
            api_key: Some(String::new()),
            sender_email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let transport = BrevoTransport::new(BrevoConfig {
            endpoint: "http://127.0.0.1:9/v3/smtp/email".to_string(),
            api_key: Some("key".to_string()),
            sender_email: Some("alerts@youcare.example".to_string()),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = transport.send("a@x.com", "subject", "body").await.unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
    }
}
