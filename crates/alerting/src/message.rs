//! Alert Message Templates

use crate::category::AlertCategory;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

/// Category-specific alert details; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Numeric field rendered for display, `0` when absent or non-numeric
    pub fn number(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => s.trim().to_string(),
            _ => "0".to_string(),
        }
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Subject and body of an outgoing alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedAlert {
    pub subject: String,
    pub body: String,
}

/// Render the message for an admitted alert. `sent_at` should already be in
/// the presentation zone.
pub fn render<Tz>(
    category: AlertCategory,
    metadata: &Metadata,
    sent_at: &DateTime<Tz>,
    brand: &str,
) -> RenderedAlert
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = sent_at.format("%I:%M %p");

    let (subject, body) = match category {
        AlertCategory::Sos | AlertCategory::Panic => (
            format!("🚨 EMERGENCY SOS ALERT ({})", time),
            "🚨 PANIC BUTTON PRESSED\n\n\
             Immediate assistance is required.\n\n\
             Please check on the user immediately."
                .to_string(),
        ),
        AlertCategory::Inactivity => (
            format!("🚨 Inactivity Alert ({})", time),
            format!("No motion detected for {} minutes.", metadata.number("minutes")),
        ),
        AlertCategory::Door => (
            format!("🚪 Door Left Open Alert ({})", time),
            format!("Door has been open for {} minutes.", metadata.number("minutes")),
        ),
        AlertCategory::Bathroom => (
            format!("🚽 Bathroom Activity Alert ({})", time),
            format!(
                "Bathroom visits today: {}\nThreshold: {}",
                metadata.number("count"),
                metadata.number("threshold")
            ),
        ),
        AlertCategory::Other => (
            format!("🚨 {} Alert ({})", brand, time),
            format!("{} Alert", brand),
        ),
    };

    RenderedAlert { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Asia::Kolkata;
    use serde_json::json;

    fn at() -> DateTime<chrono_tz::Tz> {
        // 09:45 UTC is 15:15 in Kolkata
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 45, 0)
            .unwrap()
            .with_timezone(&Kolkata)
    }

    #[test]
    fn test_emergency_template() {
        let msg = render(AlertCategory::Panic, &Metadata::new(), &at(), "YouCare");
        assert_eq!(msg.subject, "🚨 EMERGENCY SOS ALERT (03:15 PM)");
        assert!(msg.body.starts_with("🚨 PANIC BUTTON PRESSED\n\nImmediate assistance"));
        assert!(msg.body.ends_with("Please check on the user immediately."));
    }

    #[test]
    fn test_inactivity_default_minutes() {
        let msg = render(AlertCategory::Inactivity, &Metadata::new(), &at(), "YouCare");
        assert_eq!(msg.subject, "🚨 Inactivity Alert (03:15 PM)");
        assert_eq!(msg.body, "No motion detected for 0 minutes.");

        let metadata = Metadata::new().with("minutes", "soon");
        let msg = render(AlertCategory::Inactivity, &metadata, &at(), "YouCare");
        assert_eq!(msg.body, "No motion detected for 0 minutes.");
    }

    #[test]
    fn test_door_minutes() {
        let metadata = Metadata::new().with("minutes", 12);
        let msg = render(AlertCategory::Door, &metadata, &at(), "YouCare");
        assert_eq!(msg.subject, "🚪 Door Left Open Alert (03:15 PM)");
        assert_eq!(msg.body, "Door has been open for 12 minutes.");
    }

    #[test]
    fn test_bathroom_counts() {
        let metadata: Metadata = serde_json::from_value(json!({"count": 9, "threshold": "6"})).unwrap();
        let msg = render(AlertCategory::Bathroom, &metadata, &at(), "YouCare");
        assert_eq!(msg.body, "Bathroom visits today: 9\nThreshold: 6");
    }

    #[test]
    fn test_other_uses_brand() {
        let msg = render(AlertCategory::Other, &Metadata::new(), &at(), "YouCare");
        assert_eq!(msg.subject, "🚨 YouCare Alert (03:15 PM)");
        assert_eq!(msg.body, "YouCare Alert");
    }
}
