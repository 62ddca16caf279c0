//! Base gameplay constants, before any difficulty scaling.

/// Seconds a tile travels from its lane origin to the hit line at 1x.
pub const BASE_FALL_TIME: f64 = 1.5;

/// Half-width of the perfect window, in seconds.
pub const PERFECT_WINDOW: f64 = 0.1;

/// Half-width of the good window, in seconds. Also the miss deadline.
pub const GOOD_WINDOW: f64 = 0.25;

/// Tiles pre-built by the pool before play starts.
pub const INITIAL_POOL_SIZE: usize = 20;

/// Default number of lanes.
pub const NUM_LANES: usize = 4;

/// Distance from a lane origin to the hit line, in layout units.
pub const HIT_LINE_DISTANCE: f32 = 600.0;

/// Distance from a lane origin to the bottom boundary, in layout units.
pub const BOTTOM_LINE_DISTANCE: f32 = 800.0;

/// Scale applied to a tile the moment it is hit.
pub const HIT_SCALE: f32 = 1.3;

/// Index of the Normal profile in the default table.
pub const DEFAULT_DIFFICULTY: usize = 1;
