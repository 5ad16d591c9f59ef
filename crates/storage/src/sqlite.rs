//! SQLite Repository Implementation

use crate::{EventStore, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use event_intake::NormalizedEvent;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

const CREATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS sensor_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    device_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    state TEXT NOT NULL,
    value TEXT NOT NULL,
    message TEXT,
    event_time TEXT NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_sensor_events_user_time ON sensor_events (user_id, event_time)";

/// Event history stored in SQLite
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to `url` (e.g. `sqlite://youcare.db`), creating the file and
    /// schema when missing
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;

        info!("Connected to SQLite event store at {}", url);
        Ok(Self { pool })
    }
}

fn to_event(row: &SqliteRow) -> Result<NormalizedEvent, StorageError> {
    let event_time: String = row.try_get("event_time")?;
    let event_time = DateTime::parse_from_rfc3339(&event_time)
        .map_err(|e| StorageError::SerializationError(format!("event_time {:?}: {}", event_time, e)))?
        .with_timezone(&Utc);

    Ok(NormalizedEvent {
        device_id: row.try_get("device_id")?,
        subject_id: row.try_get("user_id")?,
        canonical_name: row.try_get("name")?,
        state: row.try_get("state")?,
        value: row.try_get("value")?,
        message: row.try_get("message")?,
        event_time,
    })
}

#[async_trait]
impl EventStore for SqliteRepository {
    async fn append(&self, event: &NormalizedEvent) -> Result<(), StorageError> {
        // Fixed-width UTC text keeps lexical and chronological order identical
        let event_time = event.event_time.to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(
            "INSERT INTO sensor_events (device_id, user_id, name, state, value, message, event_time)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.device_id)
        .bind(&event.subject_id)
        .bind(&event.canonical_name)
        .bind(&event.state)
        .bind(&event.value)
        .bind(&event.message)
        .bind(event_time)
        .execute(&self.pool)
        .await?;

        debug!("Stored event for {} ({})", event.subject_id, event.canonical_name);
        Ok(())
    }

    async fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<NormalizedEvent>, StorageError> {
        let rows = sqlx::query(
            "SELECT device_id, user_id, name, state, value, message, event_time
             FROM sensor_events
             WHERE user_id = ?
             ORDER BY event_time DESC
             LIMIT ?",
        )
        .bind(subject_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(to_event).collect()
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sensor_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(subject: &str, device: &str, minute: i64) -> NormalizedEvent {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        NormalizedEvent {
            device_id: device.to_string(),
            subject_id: subject.to_string(),
            canonical_name: event_intake::normalize_device_name(device),
            state: "open".to_string(),
            value: "true".to_string(),
            message: Some("Front door".to_string()),
            event_time: base + Duration::minutes(minute),
        }
    }

    #[tokio::test]
    async fn test_sqlite_round_trip() {
        // One connection so every query sees the same in-memory database
        let repo = SqliteRepository::connect("sqlite::memory:", 1).await.unwrap();

        repo.append(&event("1", "zigbee2mqtt/front_door_contact", 0)).await.unwrap();
        repo.append(&event("1", "zigbee2mqtt/hall_motion", 3)).await.unwrap();
        repo.append(&event("2", "zigbee2mqtt/hall_motion", 4)).await.unwrap();

        let recent = repo.recent("1", 100).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].canonical_name, "Hall Motion");
        assert_eq!(recent[1], event("1", "zigbee2mqtt/front_door_contact", 0));
        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
