//! Event Intake for Bridge Telemetry

use crate::error::IntakeError;
use crate::normalizer::normalize_device_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

/// Event payload as posted by the bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvent {
    /// Non-string identifiers are treated as missing
    #[serde(default, deserialize_with = "text_or_none")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub state: Option<String>,
    /// Sensor value; the bridge sends strings, numbers or booleans
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub message: Option<String>,
}

fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Validated event handed to the storage layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub device_id: String,
    pub subject_id: String,
    pub canonical_name: String,
    pub state: String,
    pub value: String,
    pub message: Option<String>,
    /// Authoritative event time, captured once at intake
    pub event_time: DateTime<Utc>,
}

/// Validates raw bridge events and stamps them
#[derive(Debug, Clone, Default)]
pub struct EventIntake;

impl EventIntake {
    /// Create a new intake
    pub fn new() -> Self {
        Self
    }

    /// Validate and normalize an event, stamping it with the current time
    pub fn ingest(&self, subject_id: &str, raw: RawEvent) -> Result<NormalizedEvent, IntakeError> {
        self.ingest_at(subject_id, raw, Utc::now())
    }

    /// Validate and normalize an event with an explicit event time
    pub fn ingest_at(
        &self,
        subject_id: &str,
        raw: RawEvent,
        event_time: DateTime<Utc>,
    ) -> Result<NormalizedEvent, IntakeError> {
        let device_id = required_text("device_id", raw.device_id)?;
        let state = required_text("state", raw.state)?;
        let value = required_value(raw.value)?;

        let canonical_name = normalize_device_name(&device_id);
        info!("Event received: {} | {} | {}", canonical_name, value, state);

        Ok(NormalizedEvent {
            device_id,
            subject_id: subject_id.to_string(),
            canonical_name,
            state,
            value,
            message: raw.message,
            event_time,
        })
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, IntakeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(IntakeError::MissingField(field)),
    }
}

fn required_value(value: Option<Value>) -> Result<String, IntakeError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        _ => Err(IntakeError::MissingField("value")),
    }
}
