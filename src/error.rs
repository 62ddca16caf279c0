//! Error type shared by the engine modules.

use std::path::PathBuf;

/// Errors surfaced by the timing core.
///
/// Misses, fall-throughs and taps on already resolved tiles are ordinary
/// state transitions and never show up here.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// A difficulty or lane index outside `[0, len)`.
    #[error("invalid {what} index {index} (expected < {len})")]
    InvalidIndex {
        what: &'static str,
        /// Signed so negative lanes from a beatmap are reported as written.
        index: i64,
        len: usize,
    },

    #[error("failed to read beatmap {path:?}: {source}")]
    BeatMapIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse beatmap: {0}")]
    BeatMapParse(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    /// A tile handle was released while already idle (or stale).
    #[error("double retirement of tile slot {slot}")]
    DoubleRetirement { slot: u32 },
}

impl EngineError {
    pub fn invalid_index(what: &'static str, index: impl Into<i64>, len: usize) -> Self {
        Self::InvalidIndex {
            what,
            index: index.into(),
            len,
        }
    }
}
