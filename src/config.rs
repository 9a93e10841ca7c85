//! Gameplay and leaderboard tuning
//!
//! Persisted separately from the session cache in LocalStorage; any load
//! failure falls back to defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::ms_to_ticks;

/// Data-driven tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // === Gameplay ===
    /// Milliseconds between spawn attempts
    pub spawn_interval_ms: u64,
    /// Live target capacity; spawn attempts beyond this are dropped
    pub target_capacity: usize,

    // === Leaderboard ===
    /// Poll cadence for top-N reads (ms)
    pub leaderboard_poll_ms: f64,
    /// Rows shown on the board
    pub top_n: usize,
    /// Recency window for the "active" badge (ms)
    pub activity_window_ms: f64,
    /// Boundary between fast and slow clicks-per-second tiers (ms)
    pub cps_fast_window_ms: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 1000 * SPAWN_INTERVAL_TICKS / TICKS_PER_SEC,
            target_capacity: TARGET_CAPACITY,
            leaderboard_poll_ms: LEADERBOARD_POLL_MS,
            top_n: LEADERBOARD_TOP_N,
            activity_window_ms: ACTIVITY_WINDOW_MS,
            cps_fast_window_ms: CPS_FAST_WINDOW_MS,
        }
    }
}

impl Config {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "orb_rush_config";

    /// Spawn cadence in simulation ticks (at least 1)
    pub fn spawn_interval_ticks(&self) -> u64 {
        ms_to_ticks(self.spawn_interval_ms).max(1)
    }

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(config) = serde_json::from_str::<Config>(&json) {
                    log::info!("Loaded config");
                    return config;
                }
                log::warn!("Unreadable config, using defaults");
            }
        }
        Self::default()
    }

    /// Save config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spawn_interval_is_one_second() {
        let config = Config::default();
        assert_eq!(config.spawn_interval_ms, 1000);
        assert_eq!(config.spawn_interval_ticks(), TICKS_PER_SEC);
    }

    #[test]
    fn test_spawn_interval_never_zero() {
        let config = Config {
            spawn_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.spawn_interval_ticks(), 1);
    }

    #[test]
    fn test_roundtrip_json() {
        let config = Config {
            target_capacity: 12,
            spawn_interval_ms: 500,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target_capacity, 12);
        assert_eq!(back.spawn_interval_ms, 500);
    }
}
