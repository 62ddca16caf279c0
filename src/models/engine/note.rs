//! Note and beatmap structures, plus JSON loading.

use crate::error::EngineError;
use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single timed note.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// When the note should be hit, in seconds of playback position.
    pub time: f64,
    /// Lane index. Kept signed so bad authoring survives loading and is
    /// rejected at spawn time instead.
    pub lane: i32,
}

impl Note {
    pub const fn new(time: f64, lane: i32) -> Self {
        Self { time, lane }
    }

    /// Lane as an index, if it is non-negative.
    pub fn lane_index(&self) -> Option<usize> {
        usize::try_from(self.lane).ok()
    }
}

/// On-disk shapes accepted for a beatmap.
#[derive(Deserialize)]
#[serde(untagged)]
enum BeatMapFile {
    Wrapped { notes: Option<Vec<Note>> },
    Bare(Vec<Note>),
}

#[derive(Serialize)]
struct BeatMapFileRef<'a> {
    notes: &'a [Note],
}

/// Ordered sequence of notes for one song.
///
/// Notes are always held in non-decreasing `time` order; the scheduler's
/// cursor depends on it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatMap {
    notes: Vec<Note>,
}

impl BeatMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a beatmap, dropping unusable times and sorting by time.
    ///
    /// The sort is stable, so simultaneous notes keep their authored order.
    pub fn from_notes(mut notes: Vec<Note>) -> Self {
        let total = notes.len();
        notes.retain(|n| n.time.is_finite() && n.time >= 0.0);
        if notes.len() < total {
            log::warn!(
                "BEATMAP: Dropped {} note(s) with negative or non-finite time",
                total - notes.len()
            );
        }

        let sorted = notes.windows(2).all(|w| w[0].time <= w[1].time);
        if !sorted {
            log::warn!("BEATMAP: Notes were not in time order, sorting");
            notes.sort_by_key(|n| OrderedFloat(n.time));
        }

        Self { notes }
    }

    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let notes = match serde_json::from_str::<BeatMapFile>(json)? {
            BeatMapFile::Wrapped { notes } => notes.unwrap_or_default(),
            BeatMapFile::Bare(notes) => notes,
        };
        Ok(Self::from_notes(notes))
    }

    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::BeatMapIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Loads a beatmap, treating a missing or broken file as an empty schedule.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::warn!("BEATMAP: No beatmap given, using an empty schedule");
            return Self::empty();
        };

        match Self::from_path(path) {
            Ok(map) => {
                log::info!("BEATMAP: Loaded {} note(s) from {:?}", map.len(), path);
                map
            }
            Err(e) => {
                log::error!("BEATMAP: {}, using an empty schedule", e);
                Self::empty()
            }
        }
    }

    pub fn to_json_string(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&BeatMapFileRef { notes: &self.notes })?)
    }

    /// Generates a random chart, mostly for headless runs.
    pub fn random<R: Rng>(rng: &mut R, count: usize, lanes: usize) -> Self {
        let lanes = lanes.max(1) as i32;
        let mut notes = Vec::with_capacity(count);
        let mut current_time = 2.0;
        for _ in 0..count {
            notes.push(Note::new(current_time, rng.random_range(0..lanes)));
            current_time += rng.random_range(0.2..0.8);
        }
        Self { notes }
    }

    /// Drops every note whose time is at or below `threshold`.
    ///
    /// Returns how many notes were removed. Running it again with the same
    /// threshold removes nothing.
    pub fn remove_early_notes(&mut self, threshold: f64) -> usize {
        let before = self.notes.len();
        self.notes.retain(|n| n.time > threshold);
        before - self.notes.len()
    }

    /// Number of notes in `[0, end)` that `remove_early_notes(threshold)` would drop.
    pub fn count_early_before(&self, end: usize, threshold: f64) -> usize {
        self.notes[..end.min(self.notes.len())]
            .iter()
            .filter(|n| n.time <= threshold)
            .count()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.notes.last().map(|n| n.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_and_bare() {
        let wrapped = BeatMap::from_json_str(r#"{"notes":[{"time":1.0,"lane":0},{"time":2.0,"lane":1}]}"#)
            .unwrap();
        let bare = BeatMap::from_json_str(r#"[{"time":1.0,"lane":0},{"time":2.0,"lane":1}]"#).unwrap();

        assert_eq!(wrapped, bare);
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped.get(1), Some(&Note::new(2.0, 1)));
    }

    #[test]
    fn test_missing_notes_field_is_empty() {
        let map = BeatMap::from_json_str("{}").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_unsorted_input_is_sorted_stably() {
        let map = BeatMap::from_notes(vec![
            Note::new(3.0, 0),
            Note::new(1.0, 2),
            Note::new(1.0, 1),
            Note::new(2.0, 3),
        ]);
        let lanes: Vec<_> = map.notes().iter().map(|n| n.lane).collect();
        assert_eq!(lanes, [2, 1, 3, 0]);
    }

    #[test]
    fn test_negative_times_are_dropped() {
        let map = BeatMap::from_notes(vec![Note::new(-1.0, 0), Note::new(f64::NAN, 0), Note::new(0.5, 0)]);
        assert_eq!(map.notes(), &[Note::new(0.5, 0)]);
    }

    #[test]
    fn test_early_note_filter_is_idempotent() {
        let mut map = BeatMap::from_notes(vec![
            Note::new(0.5, 0),
            Note::new(1.5, 1),
            Note::new(1.6, 2),
            Note::new(4.0, 3),
        ]);

        assert_eq!(map.remove_early_notes(1.5), 2);
        let once = map.clone();
        assert_eq!(map.remove_early_notes(1.5), 0);
        assert_eq!(map, once);
        assert_eq!(map.notes().first().map(|n| n.time), Some(1.6));
    }

    #[test]
    fn test_count_early_before() {
        let map = BeatMap::from_notes(vec![Note::new(0.5, 0), Note::new(1.0, 0), Note::new(3.0, 0)]);
        assert_eq!(map.count_early_before(1, 1.0), 1);
        assert_eq!(map.count_early_before(10, 1.0), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let map = BeatMap::from_notes(vec![Note::new(1.25, 0), Note::new(2.5, 3)]);
        let json = map.to_json_string().unwrap();
        assert_eq!(BeatMap::from_json_str(&json).unwrap(), map);
    }

    #[test]
    fn test_random_chart_is_sorted_and_in_lanes() {
        let map = BeatMap::random(&mut rand::rng(), 50, 4);
        assert_eq!(map.len(), 50);
        assert!(map.notes().windows(2).all(|w| w[0].time <= w[1].time));
        assert!(map.notes().iter().all(|n| (0..4).contains(&n.lane)));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let map = BeatMap::load_or_empty(Some(Path::new("definitely/not/here.json")));
        assert!(map.is_empty());
    }
}
