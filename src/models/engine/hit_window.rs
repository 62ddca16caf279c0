//! Definitions and constructors for hit window timing thresholds.

use super::constants::{GOOD_WINDOW, PERFECT_WINDOW};
use crate::models::stats::Judgement;

/// Perfect/good thresholds in seconds, measured as `|tap - target|`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HitWindow {
    pub perfect: f64,
    pub good: f64,
}

impl HitWindow {
    /// Base windows used when no difficulty scaling applies.
    pub fn new() -> Self {
        Self {
            perfect: PERFECT_WINDOW,
            good: GOOD_WINDOW,
        }
    }

    pub fn from_custom(perfect: f64, good: f64) -> Self {
        Self { perfect, good }
    }

    /// Returns these windows widened (or narrowed) by a difficulty multiplier.
    pub fn scaled(&self, timing_window_multiplier: f64) -> Self {
        Self {
            perfect: self.perfect * timing_window_multiplier,
            good: self.good * timing_window_multiplier,
        }
    }

    pub fn judge(&self, timing_diff: f64) -> Judgement {
        evaluate(timing_diff, self.perfect, self.good)
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a tap offset to a judgement tier.
///
/// Boundaries are inclusive and resolve to the stricter tier, so a tap exactly
/// `perfect` seconds off is still Perfect.
pub fn evaluate(delta: f64, perfect: f64, good: f64) -> Judgement {
    let abs_diff = delta.abs();

    if abs_diff <= perfect {
        Judgement::Perfect
    } else if abs_diff <= good {
        Judgement::Good
    } else {
        Judgement::Miss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_boundaries_favor_stricter_tier() {
        let window = HitWindow::from_custom(0.1, 0.25);

        assert_eq!(window.judge(0.1), Judgement::Perfect);
        assert_eq!(window.judge(0.1 + EPS), Judgement::Good);
        assert_eq!(window.judge(0.25), Judgement::Good);
        assert_eq!(window.judge(0.25 + EPS), Judgement::Miss);
    }

    #[test]
    fn test_early_and_late_are_symmetric() {
        let window = HitWindow::new();
        assert_eq!(window.judge(-0.02), window.judge(0.02));
        assert_eq!(window.judge(-0.2), Judgement::Good);
    }

    #[test]
    fn test_tap_shortly_after_target_is_perfect() {
        // tap at 1.02 on a tile targeting 1.0
        assert_eq!(evaluate(1.02_f64 - 1.0, 0.1, 0.25), Judgement::Perfect);
    }

    #[test]
    fn test_easy_multiplier_widens_windows() {
        let easy = HitWindow::new().scaled(1.3);
        assert!((easy.perfect - 0.13).abs() < 1e-9);
        assert!((easy.good - 0.325).abs() < 1e-9);
    }
}
