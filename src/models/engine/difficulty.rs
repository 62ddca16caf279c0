//! Difficulty profiles and the fixed table they are selected from.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Named bundle of scaling factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub name: String,
    /// Playback rate applied to the clock.
    pub music_speed: f64,
    /// How fast tiles fall; divides the base fall time.
    pub fall_speed_multiplier: f64,
    /// Scales the perfect/good windows.
    pub timing_window_multiplier: f64,
    /// Overall game speed, informational (0.5 to 2.0).
    #[serde(default = "default_overall_speed")]
    pub overall_speed: f64,
}

fn default_overall_speed() -> f64 {
    1.0
}

impl DifficultyProfile {
    pub fn new(
        name: &str,
        music_speed: f64,
        fall_speed_multiplier: f64,
        timing_window_multiplier: f64,
        overall_speed: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            music_speed,
            fall_speed_multiplier,
            timing_window_multiplier,
            overall_speed,
        }
    }

    /// Seconds a tile needs to reach the hit line under this profile.
    pub fn effective_fall_time(&self, base_fall_time: f64) -> f64 {
        base_fall_time / self.fall_speed_multiplier
    }

    /// Notes at or before this playback position cannot be reached fairly.
    pub fn early_note_threshold(&self, base_fall_time: f64) -> f64 {
        self.effective_fall_time(base_fall_time) / self.music_speed
    }

    /// Every multiplier must be strictly positive.
    pub fn is_valid(&self) -> bool {
        self.music_speed > 0.0
            && self.fall_speed_multiplier > 0.0
            && self.timing_window_multiplier > 0.0
    }
}

/// Fixed, ordered list of selectable profiles. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyTable {
    profiles: Vec<DifficultyProfile>,
}

impl DifficultyTable {
    /// Builds a table, keeping only valid profiles.
    ///
    /// Falls back to the default table when nothing usable is left.
    pub fn new(profiles: Vec<DifficultyProfile>) -> Self {
        let total = profiles.len();
        let profiles: Vec<_> = profiles.into_iter().filter(|p| p.is_valid()).collect();

        if profiles.len() < total {
            log::warn!(
                "DIFFICULTY: Dropped {} profile(s) with non-positive multipliers",
                total - profiles.len()
            );
        }

        if profiles.is_empty() {
            return Self::default();
        }

        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&DifficultyProfile, EngineError> {
        self.profiles.get(index).ok_or_else(|| {
            EngineError::invalid_index("difficulty", index as i64, self.profiles.len())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DifficultyProfile> {
        self.profiles.iter()
    }

    pub fn profiles(&self) -> &[DifficultyProfile] {
        &self.profiles
    }
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            profiles: vec![
                DifficultyProfile::new("Easy", 0.8, 0.8, 1.3, 0.8),
                DifficultyProfile::new("Normal", 1.0, 1.0, 1.0, 1.0),
                DifficultyProfile::new("Hard", 1.2, 1.3, 0.8, 1.2),
                DifficultyProfile::new("Expert", 1.5, 1.6, 0.6, 1.4),
            ],
        }
    }
}
