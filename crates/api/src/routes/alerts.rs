//! Alert Routes

use alerting::{AlertCategory, DispatchStatus, Metadata, NotificationRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Body of `POST /alert`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertBody {
    /// Alert category; missing or unknown values use the generic template
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub recipients: Option<Value>,
    pub metadata: Option<Value>,
}

fn recipients(value: Option<Value>) -> Result<Vec<String>, ApiError> {
    let list = match value {
        Some(Value::Array(list)) if !list.is_empty() => list,
        _ => return Err(ApiError::BadRequest("Recipients list required".to_string())),
    };

    list.into_iter()
        .map(|v| match v {
            Value::String(address) => Ok(address),
            other => Err(ApiError::BadRequest(format!("Invalid recipient address: {}", other))),
        })
        .collect()
}

fn metadata(value: Option<Value>) -> Metadata {
    match value {
        Some(Value::Object(map)) => Metadata::from(map),
        _ => Metadata::new(),
    }
}

/// Send an alert to the caregiver group
pub async fn send_alert(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<AlertBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let subject = state.verifier.authenticate(&headers)?;
    let Json(body) = body?;

    let request = NotificationRequest {
        subject,
        category: AlertCategory::parse(body.alert_type.as_deref().unwrap_or_default()),
        recipients: recipients(body.recipients)?,
        metadata: metadata(body.metadata),
    };

    let result = state.dispatcher.dispatch(request).await?;

    let response = match result.status {
        DispatchStatus::Suppressed => json!({
            "message": "Duplicate alert suppressed",
            "status": "suppressed",
        }),
        DispatchStatus::Sent => json!({
            "message": "Alert sent",
            "status": "sent",
            "sent": result.succeeded,
            "total": result.attempted,
            "dispatch_id": result.dispatch_id,
            "deliveries": result.deliveries,
        }),
    };

    Ok(Json(response))
}
