//! Device Name Normalization
//!
//! Collapses zigbee2mqtt topics (`zigbee2mqtt/bedroom_motion`) and Home
//! Assistant entity ids (`binary_sensor.bedroom_motion_sensor_occupancy`) to
//! the same human-readable label.

/// Name used when the identifier carries nothing usable
pub const UNKNOWN_SENSOR: &str = "Unknown Sensor";

/// Semantic suffixes stripped from the entity token, applied in order
const SUFFIXES: [&str; 4] = ["_occupancy", "_contact", "_sensor", "_binary"];

/// Convert a raw bridge identifier into a canonical device name.
///
/// Total and deterministic: every input produces a non-empty name, and
/// names already produced here map to themselves.
pub fn normalize_device_name(device_id: &str) -> String {
    if device_id.is_empty() {
        return UNKNOWN_SENSOR.to_string();
    }

    let segment = device_id.rsplit('/').next().unwrap_or(device_id);
    let token = segment.rsplit('.').next().unwrap_or(segment);

    let mut name = token.to_string();
    for suffix in SUFFIXES {
        name = name.replace(suffix, "");
    }

    let words: Vec<String> = name
        .replace('_', " ")
        .split_whitespace()
        .map(title_case)
        .collect();

    if words.is_empty() {
        UNKNOWN_SENSOR.to_string()
    } else {
        words.join(" ")
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
