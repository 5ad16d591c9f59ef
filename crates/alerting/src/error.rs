//! Alerting Error Types

use thiserror::Error;

/// Errors raised by the alerting core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// Missing or malformed request field
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be applied
    #[error("Invalid alert configuration: {0}")]
    Config(String),
}

/// Errors reported by a notification transport for a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Transport could not be reached
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// Transport answered but refused the message
    #[error("Transport rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Send did not finish before the dispatch deadline
    #[error("Timed out")]
    TimedOut,

    /// Send task panicked or was cancelled
    #[error("Send task failed: {0}")]
    TaskFailed(String),
}
