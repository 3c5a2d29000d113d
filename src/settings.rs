//! Player preferences and the debug configuration
//!
//! `Settings` persists in LocalStorage on wasm. `DebugConfig` is built once
//! at startup and handed to the scene; nothing reads debug flags globally.

use serde::{Deserialize, Serialize};

use crate::consts::PARTICLE_CAPACITY;
use crate::sim::world::Stage;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Impact particle pool capacity for this preset
    pub fn particle_capacity(&self) -> usize {
        match self {
            QualityPreset::Low => PARTICLE_CAPACITY / 4,
            QualityPreset::Medium => PARTICLE_CAPACITY,
            QualityPreset::High => PARTICLE_CAPACITY * 2,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Feedback ===
    /// Camera shake on impacts, combos and deaths
    pub screen_shake: bool,
    /// Floating damage numbers
    pub damage_numbers: bool,
    /// Impact particle bursts
    pub particles: bool,

    // === Audio (consumed by the host) ===
    pub master_volume: f32,
    pub sfx_volume: f32,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            screen_shake: true,
            damage_numbers: true,
            particles: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle pool capacity
    pub fn particle_capacity(&self) -> usize {
        if self.particles {
            self.quality.particle_capacity()
        } else {
            0
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "physics_survivor_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
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

/// Explicit debug switches, passed into the scene at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Seed for every RNG in a run
    pub seed: u64,
    /// Player ignores all damage
    pub invincible: bool,
    /// Level a run starts at
    pub start_level: u32,
    /// Raw frame delta multiplier
    pub time_multiplier: f32,
    /// Skip stage select and always use this stage
    pub forced_stage: Option<Stage>,
    pub skip_opening: bool,
    /// Log every enemy merge at info level
    pub log_merges: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            invincible: false,
            start_level: 1,
            time_multiplier: 1.0,
            forced_stage: None,
            skip_opening: false,
            log_merges: false,
        }
    }
}

impl DebugConfig {
    /// Environment variable holding a JSON `DebugConfig` (native only)
    pub const ENV_VAR: &'static str = "PHYSICS_SURVIVOR_DEBUG";

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read `PHYSICS_SURVIVOR_DEBUG`, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Debug config from {}: {:?}", Self::ENV_VAR, config);
                    config
                }
                Err(e) => {
                    log::warn!("Invalid {}: {}", Self::ENV_VAR, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Frame delta after the multiplier, never negative
    pub fn scale_delta(&self, raw_dt: f32) -> f32 {
        (raw_dt * self.time_multiplier).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_disables_shake() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_screen_shake());
        assert!(Settings::default().effective_screen_shake());
    }

    #[test]
    fn test_particle_capacity_by_preset() {
        let mut settings = Settings::default();
        assert_eq!(settings.particle_capacity(), PARTICLE_CAPACITY);
        settings.quality = QualityPreset::Low;
        assert!(settings.particle_capacity() < PARTICLE_CAPACITY);
        settings.particles = false;
        assert_eq!(settings.particle_capacity(), 0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"damage_numbers": false}"#).unwrap();
        assert!(!settings.damage_numbers);
        assert_eq!(settings.quality, QualityPreset::Medium);

        let debug =
            DebugConfig::from_json(r#"{"seed": 7, "forced_stage": "crusher-pit"}"#).unwrap();
        assert_eq!(debug.seed, 7);
        assert_eq!(debug.forced_stage, Some(Stage::CrusherPit));
        assert_eq!(debug.start_level, 1);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Settings::from_json("{not json").is_err());
        assert!(DebugConfig::from_json("[]").is_err());
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }
}
