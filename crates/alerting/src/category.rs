//! Alert Categories

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Category of a caregiver alert.
///
/// The bridge does not send a closed vocabulary, so parsing never fails:
/// anything unrecognized becomes [`AlertCategory::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    Inactivity,
    Door,
    Bathroom,
    Sos,
    /// Alias of [`AlertCategory::Sos`]
    Panic,
    Other,
}

impl AlertCategory {
    /// Parse a category name, case-insensitively
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "inactivity" => Self::Inactivity,
            "door" => Self::Door,
            "bathroom" => Self::Bathroom,
            "sos" => Self::Sos,
            "panic" => Self::Panic,
            _ => Self::Other,
        }
    }

    /// Life-safety alerts that are never suppressed
    pub fn is_emergency(self) -> bool {
        matches!(self, Self::Sos | Self::Panic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactivity => "inactivity",
            Self::Door => "door",
            Self::Bathroom => "bathroom",
            Self::Sos => "sos",
            Self::Panic => "panic",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlertCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlertCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
