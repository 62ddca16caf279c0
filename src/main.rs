//! Headless entry point: plays a beatmap with an autoplay bot.
//!
//! Usage: `tilefall [beatmap.json] [difficulty index]`

use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tilefall::logic::clock::{ManualClock, PlaybackClock};
use tilefall::logic::run_fixed_step;
use tilefall::logic::scheduler::NoteScheduler;
use tilefall::logic::score::ScoreRules;
use tilefall::logic::session::GameSession;
use tilefall::models::engine::BeatMap;
use tilefall::models::settings::{EngineSettings, SETTINGS_FILE};

/// Song tail after the last note.
const SONG_TAIL: f64 = 2.0;
/// Chance per tick that the bot holds back a due tap.
const BOT_MISS_CHANCE: f64 = 0.05;

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    log::info!("MAIN: Booting tilefall...");

    let mut args = std::env::args().skip(1);
    let beatmap_path = args.next().map(PathBuf::from);
    let difficulty = args.next().and_then(|s| s.parse::<usize>().ok());

    let settings = EngineSettings::load(Path::new(SETTINGS_FILE));

    let mut rng = rand::rng();
    let beatmap = match beatmap_path {
        Some(path) => BeatMap::load_or_empty(Some(path.as_path())),
        None => {
            log::info!("MAIN: No beatmap given, generating a random one");
            BeatMap::random(&mut rng, 64, settings.playfield.lane_count)
        }
    };
    let duration = beatmap.last_time().unwrap_or(0.0) + SONG_TAIL;

    let mut scheduler =
        NoteScheduler::new(&settings, beatmap, ManualClock::with_duration(duration));
    if let Some(index) = difficulty {
        if let Err(e) = scheduler.set_difficulty(index) {
            log::error!("MAIN: {}", e);
        }
    }

    let mut session = GameSession::new(scheduler, ScoreRules::default());
    session.start();

    let frame = Duration::from_secs_f64(1.0 / 60.0);
    let max_ticks = ((duration + 10.0) * tilefall::logic::TPS as f64) as u64;
    let ticks = run_fixed_step(&mut session, frame, max_ticks, |session| {
        let now = session.scheduler().clock().position();
        let due: Vec<_> = session
            .scheduler()
            .tiles()
            .filter(|t| t.alpha > 0.0 && t.target_time <= now)
            .map(|t| t.handle)
            .collect();
        for handle in due {
            if rng.random_bool(BOT_MISS_CHANCE) {
                continue;
            }
            session.tap(handle);
        }
    });

    let score = session.score();
    let stats = score.hit_stats();
    log::info!("MAIN: Finished after {} ticks: {:?}", ticks, session.outcome());
    log::info!(
        "MAIN: Score {} (best {}), max streak {}",
        score.score(),
        score.best_score(),
        score.max_streak()
    );
    log::info!(
        "MAIN: {} perfect / {} good / {} miss, accuracy {:.2}%",
        stats.perfect,
        stats.good,
        stats.miss,
        score.accuracy()
    );
}
