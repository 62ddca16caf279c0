//! Engine settings, loaded from and saved to TOML.

use crate::error::EngineError;
use crate::models::engine::{
    BASE_FALL_TIME, DEFAULT_DIFFICULTY, DifficultyProfile, DifficultyTable, GOOD_WINDOW,
    HitWindow, INITIAL_POOL_SIZE, PERFECT_WINDOW, PlayfieldConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default settings file name.
pub const SETTINGS_FILE: &str = "tilefall.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub base_fall_time: f64,
    pub perfect_window: f64,
    pub good_window: f64,
    /// Drop notes that would need to spawn before playback position 0.
    pub remove_early_notes: bool,
    pub initial_pool_size: usize,
    /// Hard cap on live + idle tiles. `None` lets the pool grow freely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_capacity: Option<usize>,
    pub default_difficulty: usize,
    pub playfield: PlayfieldConfig,
    /// Selectable profiles, in order. Empty means the built-in table.
    pub difficulties: Vec<DifficultyProfile>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_fall_time: BASE_FALL_TIME,
            perfect_window: PERFECT_WINDOW,
            good_window: GOOD_WINDOW,
            remove_early_notes: true,
            initial_pool_size: INITIAL_POOL_SIZE,
            pool_capacity: None,
            default_difficulty: DEFAULT_DIFFICULTY,
            playfield: PlayfieldConfig::default(),
            difficulties: Vec::new(),
        }
    }
}

impl EngineSettings {
    /// Loads settings from `path`, falling back to defaults on any error.
    pub fn load(path: &Path) -> Self {
        match load_toml::<Self>(path) {
            Ok(settings) => {
                log::info!("CONFIG: Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                log::warn!("CONFIG: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| EngineError::Config(e.to_string()))?;
        log::info!("CONFIG: Saved settings to {:?}", path);
        Ok(())
    }

    pub fn base_hit_window(&self) -> HitWindow {
        HitWindow::from_custom(self.perfect_window, self.good_window)
    }

    pub fn difficulty_table(&self) -> DifficultyTable {
        if self.difficulties.is_empty() {
            DifficultyTable::default()
        } else {
            DifficultyTable::new(self.difficulties.clone())
        }
    }
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let content = fs::read_to_string(path)
        .map_err(|e| EngineError::Config(format!("cannot read {:?}: {}", path, e)))?;
    match toml::from_str(&content) {
        Ok(data) => Ok(data),
        Err(e) => {
            log::error!("Failed to parse TOML file {:?}: {}", path, e);
            Err(EngineError::Config(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: EngineSettings = toml::from_str(
            r#"
            base_fall_time = 2.0
            pool_capacity = 8

            [playfield]
            lane_count = 6
            "#,
        )
        .unwrap();

        assert_eq!(settings.base_fall_time, 2.0);
        assert_eq!(settings.pool_capacity, Some(8));
        assert_eq!(settings.playfield.lane_count, 6);
        assert_eq!(settings.playfield.hit_line_distance, PlayfieldConfig::default().hit_line_distance);
        assert_eq!(settings.perfect_window, PERFECT_WINDOW);
        assert_eq!(settings.difficulty_table(), DifficultyTable::default());
    }

    #[test]
    fn test_custom_difficulties() {
        let settings: EngineSettings = toml::from_str(
            r#"
            [[difficulties]]
            name = "Chill"
            music_speed = 0.5
            fall_speed_multiplier = 0.5
            timing_window_multiplier = 2.0
            "#,
        )
        .unwrap();

        let table = settings.difficulty_table();
        assert_eq!(table.len(), 1);
        let chill = table.get(0).unwrap();
        assert_eq!(chill.name, "Chill");
        assert_eq!(chill.overall_speed, 1.0);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = EngineSettings::load(Path::new("no/such/tilefall.toml"));
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join("tilefall_settings_test.toml");
        let mut settings = EngineSettings::default();
        settings.good_window = 0.3;
        settings.difficulties = DifficultyTable::default().profiles().to_vec();

        settings.save(&path).unwrap();
        let loaded = EngineSettings::load(&path);
        assert_eq!(loaded, settings);

        let _ = fs::remove_file(&path);
    }
}
