//! Intake Error Types

use thiserror::Error;

/// Errors during event intake
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    /// Missing required field
    #[error("Missing event fields: {0}")]
    MissingField(&'static str),
}
