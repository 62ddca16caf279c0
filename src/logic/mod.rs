//! Timing core: clock, tile pool, scheduler, scoring and the play session.
//!
//! Everything here is driven by a fixed-timestep tick. The host owns the
//! loop; `run_fixed_step` is the headless version used by the demo binary.

pub mod clock;
pub mod pool;
pub mod ramp;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod token;

use self::clock::PlaybackClock;
use self::session::GameSession;
use std::time::Duration;

/// Ticks per second of the simulated loop.
pub const TPS: u64 = 200;

/// Upper bound on ticks run for a single frame of wall time.
const MAX_TICKS_PER_FRAME: u32 = 10;

/// Runs `session` at a fixed rate until it finishes or `max_ticks` elapse.
///
/// `on_tick` runs after each update and is where a host feeds input. Frame
/// time is simulated, so the run is deterministic.
pub fn run_fixed_step<C, F>(
    session: &mut GameSession<C>,
    frame: Duration,
    max_ticks: u64,
    mut on_tick: F,
) -> u64
where
    C: PlaybackClock,
    F: FnMut(&mut GameSession<C>),
{
    let target_dt = Duration::from_secs_f64(1.0 / TPS as f64);
    let mut accumulator = Duration::ZERO;
    let mut ticks = 0;

    while ticks < max_ticks && !session.outcome().is_finished() {
        accumulator += frame;

        let mut loops = 0;
        while accumulator >= target_dt && loops < MAX_TICKS_PER_FRAME {
            session.update(target_dt.as_secs_f64());
            on_tick(session);
            accumulator -= target_dt;
            loops += 1;
            ticks += 1;
        }

        // Drop the backlog instead of spiralling.
        if loops == MAX_TICKS_PER_FRAME && accumulator >= target_dt {
            log::warn!("LOGIC: Tick backlog of {:?} dropped", accumulator);
            accumulator = Duration::ZERO;
        }
    }

    ticks
}
