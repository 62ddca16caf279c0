//! Per-tile state machine.
//!
//! A `NoteToken` lives in a pool slot. Between `init` and `reset` it is one
//! traveling tile; once it reaches a terminal status it must be released
//! before it is touched again.

use crate::models::engine::{HIT_SCALE, HitWindow};
use crate::models::stats::Judgement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    Traveling,
    Hit,
    Missed,
    FellThrough,
}

impl TileStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TileStatus::Traveling)
    }
}

/// What happened to a tile during one `advance` call.
///
/// Both flags can be set by the same call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// The good window closed without a tap.
    pub missed: bool,
    /// The tile crossed the bottom boundary.
    pub fell_through: bool,
}

#[derive(Debug, Clone)]
pub struct NoteToken {
    target_time: f64,
    lane: usize,
    /// Layout units per second.
    fall_speed: f32,
    /// Windows of the difficulty active at spawn time.
    window: HitWindow,
    /// Distance travelled from the lane origin.
    travel: f32,
    bottom_line: f32,
    status: TileStatus,
    /// Set on spawn; the first advance pass skips the tile.
    fresh: bool,
    scale: f32,
    alpha: f32,
}

impl NoteToken {
    /// Blank token as stored idle in the pool.
    pub fn idle() -> Self {
        Self {
            target_time: 0.0,
            lane: 0,
            fall_speed: 0.0,
            window: HitWindow::new(),
            travel: 0.0,
            bottom_line: f32::INFINITY,
            status: TileStatus::Traveling,
            fresh: false,
            scale: 1.0,
            alpha: 1.0,
        }
    }

    pub fn init(
        &mut self,
        target_time: f64,
        lane: usize,
        fall_speed: f32,
        window: HitWindow,
        bottom_line: f32,
    ) {
        self.target_time = target_time;
        self.lane = lane;
        self.fall_speed = fall_speed;
        self.window = window;
        self.bottom_line = bottom_line;
        self.travel = 0.0;
        self.status = TileStatus::Traveling;
        self.fresh = true;
        self.scale = 1.0;
        self.alpha = 1.0;
    }

    /// Clears transient state so the next spawn starts clean.
    pub fn reset(&mut self) {
        self.travel = 0.0;
        self.status = TileStatus::Traveling;
        self.fresh = false;
        self.scale = 1.0;
        self.alpha = 1.0;
    }

    /// Moves the tile and runs the miss and fall-through checks.
    pub fn advance(&mut self, dt: f64, song_time: f64) -> AdvanceOutcome {
        debug_assert!(
            !self.status.is_terminal(),
            "advance on a {:?} tile (double retirement)",
            self.status
        );
        let mut outcome = AdvanceOutcome::default();
        if self.status.is_terminal() {
            return outcome;
        }

        self.travel += self.fall_speed * dt as f32;

        if song_time > self.target_time + self.window.good {
            self.status = TileStatus::Missed;
            outcome.missed = true;
        }

        // Checked even when the tile just missed.
        if self.travel > self.bottom_line {
            if !self.status.is_terminal() {
                self.status = TileStatus::FellThrough;
            }
            outcome.fell_through = true;
        }

        outcome
    }

    /// Judges a tap. Returns `None` once the tile is resolved.
    pub fn on_tap(&mut self, song_time: f64) -> Option<Judgement> {
        if self.status.is_terminal() {
            return None;
        }

        let judgement = self.window.judge(song_time - self.target_time);
        self.status = TileStatus::Hit;
        self.scale = HIT_SCALE;
        self.alpha = 0.0;
        Some(judgement)
    }

    /// Consumes the spawn-tick marker, returning whether it was set.
    pub(crate) fn take_fresh(&mut self) -> bool {
        std::mem::take(&mut self.fresh)
    }

    pub fn target_time(&self) -> f64 {
        self.target_time
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    pub fn window(&self) -> HitWindow {
        self.window
    }

    pub fn travel(&self) -> f32 {
        self.travel
    }

    pub fn status(&self) -> TileStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for NoteToken {
    fn default() -> Self {
        Self::idle()
    }
}
