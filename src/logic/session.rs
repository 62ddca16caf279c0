//! One play-through: scheduler plus score, with win and loss detection.

use super::clock::PlaybackClock;
use super::pool::TileHandle;
use super::scheduler::{NoteScheduler, TickReport};
use super::score::{ScoreAggregator, ScoreRules};
use crate::models::stats::Judgement;
use crate::system::bus::GameplayEvent;
use crossbeam_channel::Receiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Idle,
    Playing,
    Paused,
    /// The song played to its end.
    Won,
    /// A tile crossed the bottom boundary.
    Lost,
}

impl Outcome {
    pub fn is_finished(self) -> bool {
        matches!(self, Outcome::Won | Outcome::Lost)
    }
}

pub struct GameSession<C: PlaybackClock> {
    scheduler: NoteScheduler<C>,
    score: ScoreAggregator,
    events: Receiver<GameplayEvent>,
    outcome: Outcome,
    new_best: bool,
}

impl<C: PlaybackClock> GameSession<C> {
    pub fn new(mut scheduler: NoteScheduler<C>, rules: ScoreRules) -> Self {
        let events = scheduler.subscribe();
        Self {
            scheduler,
            score: ScoreAggregator::new(rules),
            events,
            outcome: Outcome::Idle,
            new_best: false,
        }
    }

    pub fn with_best_score(mut self, best_score: u64) -> Self {
        self.score = self.score.with_best_score(best_score);
        self
    }

    /// Resets score and schedule, then starts playback from the top.
    pub fn start(&mut self) {
        self.score.start_new_game();
        self.scheduler.reset_and_prepare();
        // discard events from the previous run
        self.events.try_iter().for_each(drop);
        let clock = self.scheduler.clock_mut();
        clock.stop();
        clock.play();
        self.outcome = Outcome::Playing;
        self.new_best = false;
        log::info!(
            "SESSION: Started on {} ({} notes)",
            self.scheduler.current_difficulty_name(),
            self.scheduler.beatmap().len()
        );
    }

    pub fn update(&mut self, dt: f64) -> TickReport {
        if self.outcome != Outcome::Playing {
            return TickReport::default();
        }

        let report = self.scheduler.update(dt);
        self.process_events();

        if self.outcome == Outcome::Playing && self.song_finished() {
            self.discard_leftovers();
            self.scheduler.publish(GameplayEvent::SongCompleted);
            self.events.try_iter().for_each(drop);
            self.finish(Outcome::Won);
        }
        report
    }

    /// The clock stopped by itself somewhere past the start.
    fn song_finished(&self) -> bool {
        let clock = self.scheduler.clock();
        !clock.is_playing() && clock.position() > 0.0
    }

    /// Drops notes and tiles the song ended on before they could play out.
    fn discard_leftovers(&mut self) {
        let unspawned = self.scheduler.beatmap().len() - self.scheduler.cursor();
        let active = self.scheduler.active_count();
        if unspawned > 0 || active > 0 {
            log::warn!(
                "SESSION: Song ended with {} unspawned note(s) and {} active tile(s)",
                unspawned,
                active
            );
            self.scheduler.stop_all();
        }
    }

    fn process_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                GameplayEvent::Judged { judgement, .. } => {
                    if !self.outcome.is_finished() {
                        self.score.register(judgement);
                    }
                }
                GameplayEvent::FellThrough { lane } => {
                    if self.outcome == Outcome::Playing {
                        log::info!("SESSION: Tile fell through lane {}", lane);
                        self.scheduler.stop_all();
                        self.finish(Outcome::Lost);
                    }
                }
                _ => {}
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.new_best = self.score.finish_game();
        log::info!(
            "SESSION: {:?} with score {} (accuracy {:.2}%)",
            outcome,
            self.score.score(),
            self.score.accuracy()
        );
    }

    pub fn pause(&mut self) {
        if self.outcome == Outcome::Playing {
            self.scheduler.pause();
            self.outcome = Outcome::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.outcome == Outcome::Paused {
            self.scheduler.resume();
            self.outcome = Outcome::Playing;
        }
    }

    pub fn tap(&mut self, handle: TileHandle) -> Option<Judgement> {
        if self.outcome != Outcome::Playing {
            return None;
        }
        let judgement = self.scheduler.tap(handle);
        self.process_events();
        judgement
    }

    pub fn tap_lane(&mut self, lane: usize) -> Option<Judgement> {
        if self.outcome != Outcome::Playing {
            return None;
        }
        let judgement = self.scheduler.tap_lane(lane);
        self.process_events();
        judgement
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_new_best(&self) -> bool {
        self.new_best
    }

    pub fn score(&self) -> &ScoreAggregator {
        &self.score
    }

    pub fn scheduler(&self) -> &NoteScheduler<C> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut NoteScheduler<C> {
        &mut self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clock::ManualClock;
    use crate::models::engine::{BeatMap, Note};
    use crate::models::settings::EngineSettings;

    fn session(notes: Vec<Note>, duration: f64) -> GameSession<ManualClock> {
        let settings = EngineSettings {
            remove_early_notes: false,
            ..EngineSettings::default()
        };
        let scheduler = NoteScheduler::new(
            &settings,
            BeatMap::from_notes(notes),
            ManualClock::with_duration(duration),
        );
        GameSession::new(scheduler, ScoreRules::default())
    }

    /// Taps every tile exactly on its target time.
    fn autoplay(session: &mut GameSession<ManualClock>, steps: usize) {
        for _ in 0..steps {
            session.update(0.005);
            let now = session.scheduler().clock().position();
            let due: Vec<_> = session
                .scheduler()
                .tiles()
                .filter(|t| t.target_time <= now)
                .map(|t| t.handle)
                .collect();
            for handle in due {
                session.tap(handle);
            }
        }
    }

    #[test]
    fn test_perfect_run_wins() {
        let mut s = session(vec![Note::new(1.0, 0), Note::new(1.5, 1), Note::new(2.0, 2)], 3.0);
        s.start();
        autoplay(&mut s, 1000);

        assert_eq!(s.outcome(), Outcome::Won);
        assert_eq!(s.score().hit_stats().perfect, 3);
        assert_eq!(s.score().score(), 300 + 330 + 360);
        assert!(s.is_new_best());
    }

    #[test]
    fn test_missed_tiles_still_win_when_nothing_falls_through() {
        let mut s = session(vec![Note::new(1.0, 0)], 1.5);
        s.start();
        for _ in 0..400 {
            s.update(0.005);
        }
        assert_eq!(s.outcome(), Outcome::Won);
        assert_eq!(s.score().hit_stats().miss, 1);
        assert_eq!(s.score().score(), 0);
    }

    #[test]
    fn test_fall_through_loses() {
        let settings = EngineSettings {
            perfect_window: 1.0,
            good_window: 5.0,
            remove_early_notes: false,
            ..EngineSettings::default()
        };
        let scheduler = NoteScheduler::new(
            &settings,
            BeatMap::from_notes(vec![Note::new(1.0, 1)]),
            ManualClock::with_duration(10.0),
        );
        let mut s = GameSession::new(scheduler, ScoreRules::default());

        s.start();
        for _ in 0..1000 {
            s.update(0.005);
        }
        assert_eq!(s.outcome(), Outcome::Lost);
        assert!(!s.scheduler().is_prepared());
        assert_eq!(s.scheduler().active_count(), 0);
        assert_eq!(s.update(0.005), TickReport::default());
    }

    #[test]
    fn test_pause_blocks_taps_and_updates() {
        let mut s = session(vec![Note::new(1.0, 0)], 3.0);
        s.start();
        s.update(0.1);
        s.pause();
        assert_eq!(s.outcome(), Outcome::Paused);
        assert_eq!(s.tap_lane(0), None);

        let before = s.scheduler().clock().position();
        s.update(1.0);
        assert_eq!(s.scheduler().clock().position(), before);

        s.resume();
        assert_eq!(s.outcome(), Outcome::Playing);
    }

    #[test]
    fn test_restart_resets_score() {
        let mut s = session(vec![Note::new(1.0, 0)], 2.0);
        s.start();
        autoplay(&mut s, 600);
        assert_eq!(s.score().score(), 300);

        s.start();
        assert_eq!(s.score().score(), 0);
        assert_eq!(s.score().best_score(), 300);
        assert_eq!(s.scheduler().cursor(), 0);
    }

    #[test]
    fn test_restart_mid_song_rewinds_clock() {
        let notes = (0..4).map(|i| Note::new(1.0 + i as f64 * 0.5, i)).collect();
        let mut s = session(notes, 5.0);
        s.start();
        for _ in 0..600 {
            s.update(0.005);
        }
        assert!(s.score().hit_stats().miss > 0);

        s.start();
        assert_eq!(s.scheduler().clock().position(), 0.0);
        assert!(s.scheduler().clock().is_playing());

        let mut missed = 0;
        for _ in 0..10 {
            missed += s.update(0.005).missed;
        }
        assert_eq!(missed, 0);
        assert_eq!(s.score().hit_stats().total(), 0);
        assert_eq!(s.scheduler().cursor(), 2);
    }

    #[test]
    fn test_restart_from_pause() {
        let mut s = session(vec![Note::new(1.0, 0), Note::new(2.0, 1)], 5.0);
        s.start();
        for _ in 0..300 {
            s.update(0.005);
        }
        s.pause();

        s.start();
        assert_eq!(s.outcome(), Outcome::Playing);
        assert!(!s.scheduler().is_paused());
        assert_eq!(s.scheduler().clock().position(), 0.0);

        for _ in 0..10 {
            s.update(0.005);
        }
        assert_eq!(s.score().hit_stats().miss, 0);
        assert!(s.scheduler().clock().position() > 0.0);
    }

    #[test]
    fn test_judgements_after_loss_are_not_scored() {
        let mut s = session(vec![Note::new(1.0, 0)], 5.0);
        s.start();
        s.scheduler_mut().publish(GameplayEvent::FellThrough { lane: 0 });
        s.scheduler_mut().publish(GameplayEvent::Judged {
            judgement: Judgement::Perfect,
            lane: 1,
            delta: 0.0,
        });
        s.update(0.005);

        assert_eq!(s.outcome(), Outcome::Lost);
        assert_eq!(s.score().score(), 0);
        assert_eq!(s.score().hit_stats().total(), 0);
        assert!(!s.is_new_best());
    }

    #[test]
    fn test_song_ending_early_still_finishes() {
        let mut s = session(vec![Note::new(1.0, 0), Note::new(8.0, 1)], 2.0);
        s.start();
        for _ in 0..600 {
            s.update(0.005);
        }

        assert_eq!(s.outcome(), Outcome::Won);
        assert!(!s.scheduler().is_exhausted());
        assert_eq!(s.scheduler().active_count(), 0);
        assert_eq!(s.scheduler().pool().in_flight(), 0);
    }
}
