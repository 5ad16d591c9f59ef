//! Event Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use event_intake::RawEvent;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Event as returned to the app
#[derive(Debug, Serialize)]
pub struct EventView {
    pub entity_id: String,
    pub name: String,
    pub state: String,
    pub message: Option<String>,
    pub value: String,
    /// Event time in the configured zone, RFC 3339
    pub when: String,
}

/// Store an event posted by the bridge
pub async fn add_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<RawEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let subject = state.verifier.authenticate(&headers)?;
    let Json(raw) = body?;
    let event = state.intake.ingest(subject.as_str(), raw)?;
    state.store.append(&event).await?;
    metrics::counter!("events_ingested_total").increment(1);

    Ok((StatusCode::CREATED, Json(json!({ "message": "Event added" }))))
}

/// Latest events for the caller, newest first
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let subject = state.verifier.authenticate(&headers)?;
    let events = state
        .store
        .recent(subject.as_str(), state.settings.storage.recent_limit)
        .await?;

    let views = events
        .into_iter()
        .map(|e| EventView {
            entity_id: e.device_id,
            name: e.canonical_name,
            state: e.state,
            message: e.message,
            value: e.value,
            when: e.event_time.with_timezone(&state.tz).to_rfc3339(),
        })
        .collect();

    Ok(Json(views))
}
