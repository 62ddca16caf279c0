pub mod constants;
pub mod difficulty;
pub mod hit_window;
pub mod note;
pub mod playfield;

pub use constants::*;
pub use difficulty::{DifficultyProfile, DifficultyTable};
pub use hit_window::HitWindow;
pub use note::{BeatMap, Note};
pub use playfield::PlayfieldConfig;
