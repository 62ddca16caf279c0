//! Playfield configuration and layout.

use super::constants::{BOTTOM_LINE_DISTANCE, HIT_LINE_DISTANCE, NUM_LANES};
use serde::{Deserialize, Serialize};

/// Geometry the tiles travel through.
///
/// Distances are measured downward from the lane origin, where every tile
/// spawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    pub lane_count: usize,
    pub hit_line_distance: f32,
    pub bottom_line_distance: f32,
}

impl PlayfieldConfig {
    pub fn new() -> Self {
        Self {
            lane_count: NUM_LANES,
            hit_line_distance: HIT_LINE_DISTANCE,
            bottom_line_distance: BOTTOM_LINE_DISTANCE,
        }
    }

    /// Vertical distance between the lane origin and the hit line.
    pub fn vertical_distance(&self) -> f32 {
        self.hit_line_distance.abs()
    }

    pub fn has_lane(&self, lane: usize) -> bool {
        lane < self.lane_count
    }
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self::new()
    }
}
