//! Score and perfect-streak aggregation.
//!
//! Consumes judgements only; it never looks at tiles or the clock.

use crate::models::stats::{HitStats, Judgement};
use serde::{Deserialize, Serialize};

/// Points awarded per tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRules {
    pub base_perfect_score: u32,
    pub base_good_score: u32,
    /// Extra fraction of the perfect score per consecutive perfect.
    pub streak_bonus_multiplier: f64,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            base_perfect_score: 300,
            base_good_score: 150,
            streak_bonus_multiplier: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    rules: ScoreRules,
    score: u64,
    perfect_streak: u32,
    max_streak: u32,
    best_score: u64,
    hit_stats: HitStats,
}

impl ScoreAggregator {
    pub fn new(rules: ScoreRules) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    /// Starts from a previously recorded best score.
    pub fn with_best_score(mut self, best_score: u64) -> Self {
        self.best_score = best_score;
        self
    }

    pub fn start_new_game(&mut self) {
        self.score = 0;
        self.perfect_streak = 0;
        self.max_streak = 0;
        self.hit_stats = HitStats::new();
        log::debug!("SCORE: New game started, score reset");
    }

    /// Applies one judgement and returns the points it awarded.
    pub fn register(&mut self, judgement: Judgement) -> u64 {
        self.hit_stats.record(judgement);

        let points = match judgement {
            Judgement::Perfect => {
                self.perfect_streak += 1;
                self.max_streak = self.max_streak.max(self.perfect_streak);
                let bonus = 1.0
                    + (self.perfect_streak - 1) as f64 * self.rules.streak_bonus_multiplier;
                (self.rules.base_perfect_score as f64 * bonus).round() as u64
            }
            Judgement::Good => {
                self.perfect_streak = 0;
                self.rules.base_good_score as u64
            }
            Judgement::Miss => {
                self.perfect_streak = 0;
                0
            }
        };

        self.score += points;
        points
    }

    /// Closes the run. Returns `true` when it set a new best score.
    pub fn finish_game(&mut self) -> bool {
        if self.score > self.best_score {
            self.best_score = self.score;
            log::info!("SCORE: New best score {}", self.score);
            true
        } else {
            log::info!(
                "SCORE: Game ended. Score: {}, Best: {}",
                self.score,
                self.best_score
            );
            false
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn perfect_streak(&self) -> u32 {
        self.perfect_streak
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn hit_stats(&self) -> &HitStats {
        &self.hit_stats
    }

    pub fn accuracy(&self) -> f64 {
        self.hit_stats.calculate_accuracy()
    }
}
