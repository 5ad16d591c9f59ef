//! Battery Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Body of `POST /battery`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BatteryUpdate {
    pub device: Option<String>,
    pub battery: Option<Value>,
}

fn level(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Record a battery reading pushed by the bridge
pub async fn battery_update(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatteryUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(update) = body?;
    let (device, battery) = match (update.device, update.battery.as_ref().and_then(level)) {
        (Some(device), Some(battery)) if !device.is_empty() => (device, battery),
        _ => return Err(ApiError::BadRequest("Missing device or battery".to_string())),
    };

    state.batteries.record(&device, battery);
    Ok(Json(json!({ "ok": true })))
}

/// Latest reading for every device
pub async fn get_battery(State(state): State<Arc<AppState>>) -> Json<HashMap<String, f64>> {
    Json(state.batteries.snapshot())
}
