//! Latest battery readings per device

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

/// Most recent battery level reported for each device; last write wins
#[derive(Debug, Default)]
pub struct BatteryRegistry {
    levels: RwLock<HashMap<String, f64>>,
}

impl BatteryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading
    pub fn record(&self, device: &str, level: f64) {
        let mut levels = self.levels.write().unwrap_or_else(|e| e.into_inner());
        levels.insert(device.to_string(), level);
        info!("Battery update: {} at {}%", device, level);
    }

    /// Latest level for one device
    pub fn get(&self, device: &str) -> Option<f64> {
        self.levels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(device)
            .copied()
    }

    /// Copy of all readings
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.levels.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
