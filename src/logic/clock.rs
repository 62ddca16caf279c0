//! Playback clock interface.
//!
//! The engine never owns audio. It reads the song position from a
//! `PlaybackClock` and only drives it through explicit rate, pause, resume
//! and seek calls.

/// Song position source, normally backed by the audio device.
pub trait PlaybackClock {
    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Playback rate multiplier.
    fn rate(&self) -> f64;

    fn set_rate(&mut self, rate: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Stops playback and rewinds to 0.
    fn stop(&mut self);

    fn seek(&mut self, seconds: f64);

    fn is_playing(&self) -> bool;

    /// Advances clocks that are driven by the host tick.
    ///
    /// Device-backed clocks keep their own time and ignore this.
    fn advance(&mut self, _dt: f64) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockState {
    Stopped,
    Playing,
    Paused,
    /// Reached the end of the song on its own.
    Ended,
}

/// Clock advanced by the host tick, scaled by its rate.
///
/// Used for headless runs and tests; mirrors how an audio clock behaves,
/// including stopping by itself at the end of the song.
#[derive(Debug, Clone)]
pub struct ManualClock {
    position: f64,
    rate: f64,
    state: ClockState,
    duration: Option<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            rate: 1.0,
            state: ClockState::Stopped,
            duration: None,
        }
    }

    /// Clock for a song of the given length in seconds.
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::new()
        }
    }

    pub fn has_ended(&self) -> bool {
        self.state == ClockState::Ended
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for ManualClock {
    fn position(&self) -> f64 {
        self.position
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn play(&mut self) {
        if self.state == ClockState::Ended {
            self.position = 0.0;
        }
        self.state = ClockState::Playing;
    }

    fn pause(&mut self) {
        if self.state == ClockState::Playing {
            self.state = ClockState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state == ClockState::Paused {
            self.state = ClockState::Playing;
        }
    }

    fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.position = 0.0;
    }

    fn seek(&mut self, seconds: f64) {
        self.position = match self.duration {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        };
    }

    fn is_playing(&self) -> bool {
        self.state == ClockState::Playing
    }

    fn advance(&mut self, dt: f64) {
        if self.state != ClockState::Playing {
            return;
        }

        self.position += dt * self.rate;

        if let Some(duration) = self.duration {
            if self.position >= duration {
                self.position = duration;
                self.state = ClockState::Ended;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_scales_by_rate() {
        let mut clock = ManualClock::new();
        clock.set_rate(1.5);
        clock.play();
        clock.advance(2.0);
        assert!((clock.position() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_paused_clock_does_not_move() {
        let mut clock = ManualClock::new();
        clock.play();
        clock.advance(1.0);
        clock.pause();
        clock.advance(5.0);
        assert_eq!(clock.position(), 1.0);
        clock.resume();
        clock.advance(0.5);
        assert_eq!(clock.position(), 1.5);
    }

    #[test]
    fn test_song_end_stops_but_keeps_position() {
        let mut clock = ManualClock::with_duration(2.0);
        clock.play();
        clock.advance(3.0);
        assert!(!clock.is_playing());
        assert!(clock.has_ended());
        assert_eq!(clock.position(), 2.0);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut clock = ManualClock::new();
        clock.play();
        clock.advance(1.0);
        clock.stop();
        assert_eq!(clock.position(), 0.0);
        assert!(!clock.is_playing());
    }
}
