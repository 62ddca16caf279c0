//! Progressive speed ramp.
//!
//! Advanced by the same tick as the scheduler; it only produces the next
//! speed, the scheduler decides where to apply it.

/// Seconds between two speed steps.
pub const RAMP_STEP_INTERVAL: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedRamp {
    start_speed: f64,
    /// Speed gained per minute of play.
    rate_per_minute: f64,
    max_speed: f64,
    elapsed: f64,
    since_step: f64,
}

impl SpeedRamp {
    pub fn new(start_speed: f64, rate_per_minute: f64, max_speed: f64) -> Self {
        Self {
            start_speed,
            rate_per_minute,
            max_speed,
            elapsed: 0.0,
            since_step: 0.0,
        }
    }

    /// Accumulates `dt` and returns the new speed whenever a step is due.
    pub fn advance(&mut self, dt: f64) -> Option<f64> {
        self.elapsed += dt;
        self.since_step += dt;

        if self.since_step < RAMP_STEP_INTERVAL {
            return None;
        }
        self.since_step %= RAMP_STEP_INTERVAL;

        Some(self.speed_at(self.elapsed))
    }

    pub fn speed_at(&self, elapsed: f64) -> f64 {
        (self.start_speed + self.rate_per_minute * elapsed / 60.0).min(self.max_speed)
    }

    pub fn is_done(&self, current_speed: f64) -> bool {
        current_speed >= self.max_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_once_per_interval() {
        let mut ramp = SpeedRamp::new(1.0, 6.0, 2.0);
        assert_eq!(ramp.advance(0.5), None);
        let speed = ramp.advance(0.5).unwrap();
        // 1.0 + 6.0 * 1s / 60
        assert!((speed - 1.1).abs() < 1e-9);
        assert_eq!(ramp.advance(0.25), None);
    }

    #[test]
    fn test_large_dt_catches_up_in_one_step() {
        let mut ramp = SpeedRamp::new(1.0, 6.0, 2.0);
        let speed = ramp.advance(5.0).unwrap();
        assert!((speed - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_to_max() {
        let mut ramp = SpeedRamp::new(1.0, 600.0, 1.5);
        assert_eq!(ramp.advance(1.0), Some(1.5));
        assert!(ramp.is_done(1.5));
    }
}
