//! Note scheduler: spawns tiles from the beatmap, advances them and retires
//! them back into the pool.
//!
//! All time comparisons use the playback clock. Within one `update` the
//! spawn pass runs before any tile is advanced, and tiles spawned in that
//! pass are first advanced on the following tick.

use super::clock::PlaybackClock;
use super::pool::{TileHandle, TilePool};
use super::ramp::SpeedRamp;
use super::token::TileStatus;
use crate::error::EngineError;
use crate::models::engine::{BeatMap, DifficultyProfile, DifficultyTable, HitWindow, Note, PlayfieldConfig};
use crate::models::settings::EngineSettings;
use crate::models::stats::Judgement;
use crate::system::bus::{EventBus, GameplayEvent};
use crossbeam_channel::Receiver;

/// Counters for one `update` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: usize,
    pub missed: usize,
    pub fell_through: usize,
}

/// Render-side view of one active tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileView {
    pub handle: TileHandle,
    pub lane: usize,
    pub target_time: f64,
    /// Offset below the lane origin.
    pub travel: f32,
    pub scale: f32,
    pub alpha: f32,
}

pub struct NoteScheduler<C: PlaybackClock> {
    beatmap: BeatMap,
    /// Next note not yet spawned.
    cursor: usize,
    pool: TilePool,
    active: Vec<TileHandle>,

    difficulties: DifficultyTable,
    current_index: usize,
    /// Working copy of the selected profile; the speed ramp edits this.
    current: DifficultyProfile,
    base_fall_time: f64,
    effective_fall_time: f64,
    base_window: HitWindow,
    remove_early_notes: bool,
    playfield: PlayfieldConfig,

    clock: C,
    bus: EventBus,
    is_paused: bool,
    is_prepared: bool,
    pause_position: f64,
    ramp: Option<SpeedRamp>,
}

impl<C: PlaybackClock> NoteScheduler<C> {
    /// Builds a scheduler and applies the configured default difficulty.
    ///
    /// The beatmap is filtered right away when early-note removal is on.
    pub fn new(settings: &EngineSettings, beatmap: BeatMap, clock: C) -> Self {
        let difficulties = settings.difficulty_table();
        let current = difficulties.profiles()[0].clone();
        let effective_fall_time = current.effective_fall_time(settings.base_fall_time);

        let mut scheduler = Self {
            beatmap,
            cursor: 0,
            pool: TilePool::new(settings.initial_pool_size, settings.pool_capacity),
            active: Vec::with_capacity(settings.initial_pool_size),
            difficulties,
            current_index: 0,
            current,
            base_fall_time: settings.base_fall_time,
            effective_fall_time,
            base_window: settings.base_hit_window(),
            remove_early_notes: settings.remove_early_notes,
            playfield: settings.playfield.clone(),
            clock,
            bus: EventBus::new(),
            is_paused: false,
            is_prepared: false,
            pause_position: 0.0,
            ramp: None,
        };

        if scheduler.set_difficulty(settings.default_difficulty).is_err() {
            log::warn!("SCHEDULER: Falling back to the first difficulty");
            // Index 0 always exists.
            let _ = scheduler.set_difficulty(0);
        }
        scheduler
    }

    /// Subscribes to judgement, spawn and difficulty events.
    pub fn subscribe(&mut self) -> Receiver<GameplayEvent> {
        self.bus.subscribe()
    }

    pub(crate) fn publish(&mut self, event: GameplayEvent) {
        self.bus.publish(event);
    }

    // ===== Difficulty =====

    /// Selects a profile by index.
    ///
    /// Out-of-range indices change nothing. Tiles already in flight keep the
    /// windows they were spawned with.
    pub fn set_difficulty(&mut self, index: usize) -> Result<(), EngineError> {
        let profile = match self.difficulties.get(index) {
            Ok(profile) => profile.clone(),
            Err(e) => {
                log::warn!("SCHEDULER: {}", e);
                return Err(e);
            }
        };

        self.current_index = index;
        self.current = profile;
        self.apply_current_profile();

        log::info!(
            "SCHEDULER: Difficulty set to {} (music {}x, fall {}x, windows {}x)",
            self.current.name,
            self.current.music_speed,
            self.current.fall_speed_multiplier,
            self.current.timing_window_multiplier
        );
        self.bus.publish(GameplayEvent::DifficultyChanged {
            index,
            name: self.current.name.clone(),
            music_speed: self.current.music_speed,
        });

        if self.remove_early_notes {
            self.filter_early_notes();
        }
        Ok(())
    }

    pub fn increase_difficulty(&mut self) {
        if self.current_index + 1 < self.difficulties.len() {
            let _ = self.set_difficulty(self.current_index + 1);
        }
    }

    pub fn decrease_difficulty(&mut self) {
        if self.current_index > 0 {
            let _ = self.set_difficulty(self.current_index - 1);
        }
    }

    fn apply_current_profile(&mut self) {
        self.effective_fall_time = self.current.effective_fall_time(self.base_fall_time);
        self.clock.set_rate(self.current.music_speed);
    }

    /// Drops notes that would have to spawn before playback position 0.
    ///
    /// The cursor keeps pointing at the same next note.
    pub fn filter_early_notes(&mut self) -> usize {
        let threshold = self.current.early_note_threshold(self.base_fall_time);
        let spawned_removed = self.beatmap.count_early_before(self.cursor, threshold);
        let removed = self.beatmap.remove_early_notes(threshold);
        self.cursor -= spawned_removed;

        if removed > 0 {
            log::info!(
                "SCHEDULER: Removed {} early note(s) (threshold: {:.2}s) for {}",
                removed,
                threshold,
                self.current.name
            );
        }
        removed
    }

    // ===== Speed ramp =====

    /// Gradually raises music and fall speed while the song plays.
    pub fn start_speed_ramp(&mut self, rate_per_minute: f64, max_speed: f64) {
        log::info!(
            "SCHEDULER: Speed ramp started (+{}/min, max {}x)",
            rate_per_minute,
            max_speed
        );
        self.ramp = Some(SpeedRamp::new(
            self.current.music_speed,
            rate_per_minute,
            max_speed,
        ));
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }

    fn update_ramp(&mut self, dt: f64) {
        let Some(ramp) = self.ramp.as_mut() else {
            return;
        };

        if !self.clock.is_playing() || ramp.is_done(self.current.music_speed) {
            log::debug!("SCHEDULER: Speed ramp finished at {}x", self.current.music_speed);
            self.ramp = None;
            return;
        }

        if let Some(speed) = ramp.advance(dt) {
            self.current.music_speed = speed;
            self.current.fall_speed_multiplier = speed;
            self.apply_current_profile();
        }
    }

    // ===== Play control =====

    /// Rewinds the schedule and arms it for a new run.
    ///
    /// Leftover tiles from a previous run are discarded without judgement.
    pub fn reset_and_prepare(&mut self) {
        self.discard_active();
        self.cursor = 0;
        self.is_prepared = true;
        self.is_paused = false;
        self.clock.set_rate(self.current.music_speed);

        if self.remove_early_notes {
            self.filter_early_notes();
        }
    }

    /// Freezes ticking and the clock, remembering the exact position.
    pub fn pause(&mut self) {
        if self.is_paused {
            return;
        }
        self.is_paused = true;
        self.pause_position = self.clock.position();
        self.clock.pause();
        log::debug!("SCHEDULER: Paused at {:.3}s", self.pause_position);
    }

    /// Restores the position captured by `pause` and restarts the clock.
    pub fn resume(&mut self) {
        if !self.is_paused {
            return;
        }
        self.is_paused = false;
        self.clock.seek(self.pause_position);
        self.clock.set_rate(self.current.music_speed);
        self.clock.resume();
        log::debug!("SCHEDULER: Resumed at {:.3}s", self.pause_position);
    }

    /// Disarms the schedule and returns every active tile to the pool.
    ///
    /// No judgement is emitted for the discarded tiles.
    pub fn stop_all(&mut self) {
        self.is_prepared = false;
        self.discard_active();
        if self.clock.is_playing() {
            self.clock.stop();
        }
        self.ramp = None;
    }

    fn discard_active(&mut self) {
        for handle in self.active.drain(..) {
            if self.pool.release(handle).is_ok() {
                self.bus.publish(GameplayEvent::TileRetired { handle });
            }
        }
    }

    // ===== Per-frame =====

    /// One host tick: advance the clock, spawn due notes, then move tiles.
    pub fn update(&mut self, dt: f64) -> TickReport {
        if !self.is_prepared || self.is_paused {
            return TickReport::default();
        }

        self.clock.advance(dt);
        let song_time = self.clock.position();

        self.update_ramp(dt);
        let spawned = self.tick(song_time);
        let mut report = self.advance_tiles(dt, song_time);
        report.spawned = spawned;
        report
    }

    /// Spawns every note due at `song_time`, in order, and returns how many
    /// notes the cursor moved past.
    pub fn tick(&mut self, song_time: f64) -> usize {
        if !self.is_prepared || self.is_paused || self.beatmap.is_empty() {
            return 0;
        }

        let start = self.cursor;
        while let Some(note) = self.beatmap.get(self.cursor).copied() {
            if song_time < note.time - self.effective_fall_time {
                break;
            }
            self.cursor += 1;
            self.spawn(note);
        }
        self.cursor - start
    }

    fn spawn(&mut self, note: Note) -> Option<TileHandle> {
        let lane = match note.lane_index().filter(|&l| self.playfield.has_lane(l)) {
            Some(lane) => lane,
            None => {
                let e = EngineError::invalid_index("lane", note.lane, self.playfield.lane_count);
                log::warn!("SCHEDULER: {} (note at {:.3}s)", e, note.time);
                return None;
            }
        };

        let Some(handle) = self.pool.acquire() else {
            log::warn!(
                "SCHEDULER: Pool at capacity ({:?}), dropping note at {:.3}s",
                self.pool.capacity(),
                note.time
            );
            return None;
        };

        let fall_speed = (self.playfield.vertical_distance() as f64 / self.effective_fall_time
            * self.current.fall_speed_multiplier) as f32;
        let window = self.base_window.scaled(self.current.timing_window_multiplier);

        if let Some(token) = self.pool.get_mut(handle) {
            token.init(
                note.time,
                lane,
                fall_speed,
                window,
                self.playfield.bottom_line_distance,
            );
        }
        self.active.push(handle);
        self.bus.publish(GameplayEvent::TileSpawned { handle, lane });
        Some(handle)
    }

    fn advance_tiles(&mut self, dt: f64, song_time: f64) -> TickReport {
        let mut report = TickReport::default();
        let pool = &mut self.pool;
        let bus = &mut self.bus;

        self.active.retain(|&handle| {
            let Some(token) = pool.get_mut(handle) else {
                return false;
            };
            if token.take_fresh() {
                return true;
            }

            let outcome = token.advance(dt, song_time);
            let lane = token.lane();

            if outcome.missed {
                report.missed += 1;
                bus.publish(GameplayEvent::Judged {
                    judgement: Judgement::Miss,
                    lane,
                    delta: song_time - token.target_time(),
                });
            }
            if outcome.fell_through {
                report.fell_through += 1;
                bus.publish(GameplayEvent::FellThrough { lane });
            }

            if token.is_terminal() {
                if pool.release(handle).is_ok() {
                    bus.publish(GameplayEvent::TileRetired { handle });
                }
                return false;
            }
            true
        });

        report
    }

    // ===== Input =====

    /// Judges a tap on a specific tile.
    ///
    /// Taps on tiles that are already resolved (or retired) return `None`.
    pub fn tap(&mut self, handle: TileHandle) -> Option<Judgement> {
        if !self.is_prepared || self.is_paused {
            return None;
        }
        let song_time = self.clock.position();
        let token = self.pool.get_mut(handle)?;
        let judgement = token.on_tap(song_time)?;
        let lane = token.lane();
        let delta = song_time - token.target_time();

        self.bus.publish(GameplayEvent::Judged {
            judgement,
            lane,
            delta,
        });
        self.retire(handle);
        Some(judgement)
    }

    /// Judges a tap in `lane` against the closest traveling tile there.
    pub fn tap_lane(&mut self, lane: usize) -> Option<Judgement> {
        let song_time = self.clock.position();
        let handle = self
            .active
            .iter()
            .filter_map(|&h| self.pool.get(h).map(|t| (h, t)))
            .filter(|(_, t)| t.lane() == lane && t.status() == TileStatus::Traveling)
            .min_by(|(_, a), (_, b)| {
                let da = (song_time - a.target_time()).abs();
                let db = (song_time - b.target_time()).abs();
                da.total_cmp(&db)
            })
            .map(|(h, _)| h)?;
        self.tap(handle)
    }

    fn retire(&mut self, handle: TileHandle) {
        if let Some(pos) = self.active.iter().position(|&h| h == handle) {
            self.active.remove(pos);
        }
        if self.pool.release(handle).is_ok() {
            self.bus.publish(GameplayEvent::TileRetired { handle });
        }
    }

    // ===== Getters =====

    pub fn tiles(&self) -> impl Iterator<Item = TileView> + '_ {
        self.active.iter().filter_map(|&handle| {
            self.pool.get(handle).map(|t| TileView {
                handle,
                lane: t.lane(),
                target_time: t.target_time(),
                travel: t.travel(),
                scale: t.scale(),
                alpha: t.alpha(),
            })
        })
    }

    pub fn current_difficulty(&self) -> &DifficultyProfile {
        &self.current
    }

    pub fn current_difficulty_name(&self) -> &str {
        &self.current.name
    }

    pub fn current_difficulty_index(&self) -> usize {
        self.current_index
    }

    pub fn difficulties(&self) -> &DifficultyTable {
        &self.difficulties
    }

    pub fn effective_fall_time(&self) -> f64 {
        self.effective_fall_time
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Every note has been spawned.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.beatmap.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_handles(&self) -> &[TileHandle] {
        &self.active
    }

    pub fn pool(&self) -> &TilePool {
        &self.pool
    }

    pub fn beatmap(&self) -> &BeatMap {
        &self.beatmap
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_prepared(&self) -> bool {
        self.is_prepared
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
