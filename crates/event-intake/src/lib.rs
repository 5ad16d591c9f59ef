//! Event Intake
//!
//! Normalizes device identity and validates telemetry events coming from the
//! home-automation bridge before they are handed to storage.

mod error;
mod intake;
mod normalizer;

pub use error::IntakeError;
pub use intake::{EventIntake, NormalizedEvent, RawEvent};
pub use normalizer::{normalize_device_name, UNKNOWN_SENSOR};
