//! Tilefall: timing and judgement core for a four-lane falling-tile rhythm game.

pub mod error;
pub mod logic;
pub mod models;
pub mod system;

pub use error::EngineError;
