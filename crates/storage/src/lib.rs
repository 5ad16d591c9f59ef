//! Storage Layer
//!
//! Append-only sensor event history behind the [`EventStore`] trait, with an
//! in-memory and a SQLite implementation, plus the latest battery readings.

mod battery;
mod repository;
mod sqlite;

pub use battery::BatteryRegistry;
pub use repository::Repository;
pub use sqlite::SqliteRepository;

use async_trait::async_trait;
use event_intake::NormalizedEvent;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            other => StorageError::DatabaseError(other.to_string()),
        }
    }
}

/// Durable sensor event history
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event
    async fn append(&self, event: &NormalizedEvent) -> Result<(), StorageError>;

    /// Most recent events for a subject, newest first
    async fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<NormalizedEvent>, StorageError>;

    /// Total number of stored events
    async fn count(&self) -> Result<usize, StorageError>;
}
