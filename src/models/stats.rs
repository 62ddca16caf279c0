//! Hit statistics and judgement types.
//!
//! This module defines the three judgement tiers emitted by the engine,
//! plus the per-tier counters used for accuracy.

/// Judgement tiers from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Judgement {
    /// Tap inside the perfect window.
    Perfect,
    /// Tap inside the good window but outside the perfect one.
    Good,
    /// Tap outside the good window, or no tap before the window closed.
    Miss,
}

/// Accumulated hit statistics for a play session.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HitStats {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
}

impl HitStats {
    /// Creates empty hit statistics.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, judgement: Judgement) {
        match judgement {
            Judgement::Perfect => self.perfect += 1,
            Judgement::Good => self.good += 1,
            Judgement::Miss => self.miss += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.good + self.miss
    }

    /// Calculates accuracy percentage (0-100).
    ///
    /// Perfect weighs 2 points, Good 1 point, Miss nothing.
    pub fn calculate_accuracy(&self) -> f64 {
        let total = self.total() as f64;

        if total == 0.0 {
            return 0.0;
        }

        let score = self.perfect as f64 * 2.0 + self.good as f64;

        (score / (total * 2.0)) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_empty_is_zero() {
        assert_eq!(HitStats::new().calculate_accuracy(), 0.0);
    }

    #[test]
    fn test_accuracy_weights() {
        let mut stats = HitStats::new();
        stats.record(Judgement::Perfect);
        stats.record(Judgement::Good);
        stats.record(Judgement::Miss);
        stats.record(Judgement::Perfect);

        assert_eq!(stats.total(), 4);
        // (2 + 1 + 0 + 2) / 8
        assert!((stats.calculate_accuracy() - 62.5).abs() < 1e-9);
    }
}
