//! `InterestScore`: per-topic engagement score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::clamp01;

/// Per-topic interest score, `s = 0.4*recency + 0.3*frequency + 0.2*depth + 0.1*novelty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestScore {
    pub topic: String,
    pub recency: f32,
    pub frequency: f32,
    pub depth: f32,
    pub novelty: f32,
    pub last_updated: DateTime<Utc>,
}

/// Daily decay factor applied to the whole score (§3).
pub const DECAY_PER_DAY: f32 = 0.95;
/// Scores below this are pruned.
pub const PRUNE_THRESHOLD: f32 = 0.01;

impl InterestScore {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            recency: 0.0,
            frequency: 0.0,
            depth: 0.0,
            novelty: 1.0,
            last_updated: Utc::now(),
        }
    }

    /// Composite score in `[0,1]`.
    pub fn score(&self) -> f32 {
        clamp01(0.4 * self.recency + 0.3 * self.frequency + 0.2 * self.depth + 0.1 * self.novelty)
    }

    /// Applies the daily decay for `days` elapsed (may be fractional).
    pub fn decay(&mut self, days: f32) {
        let factor = DECAY_PER_DAY.powf(days.max(0.0));
        self.recency = clamp01(self.recency * factor);
        self.frequency = clamp01(self.frequency * factor);
        self.depth = clamp01(self.depth * factor);
        self.novelty = clamp01(self.novelty * factor);
    }

    pub fn should_prune(&self) -> bool {
        self.score() < PRUNE_THRESHOLD
    }

    /// Records an interaction with this topic: recency snaps to 1 and
    /// decays over 14 days, frequency increments log-normalized, depth
    /// grows with content length (capped), novelty falls off over 7 days.
    pub fn record_interaction(&mut self, content_len: usize, age_days: f32) {
        self.recency = 1.0;
        self.frequency = clamp01(self.frequency + (1.0 + self.frequency).ln() / 10.0);
        self.depth = clamp01(self.depth + 0.1 * (content_len as f32 / 500.0).min(1.0));
        self.novelty = clamp01(1.0 - age_days / 7.0);
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_formula_weights() {
        let s = InterestScore {
            topic: "t".into(),
            recency: 1.0,
            frequency: 1.0,
            depth: 1.0,
            novelty: 1.0,
            last_updated: Utc::now(),
        };
        assert!((s.score() - 1.0).abs() < 1e-6);

        let zero = InterestScore {
            topic: "t".into(),
            recency: 0.0,
            frequency: 0.0,
            depth: 0.0,
            novelty: 0.0,
            last_updated: Utc::now(),
        };
        assert_eq!(zero.score(), 0.0);
    }

    #[test]
    fn decay_shrinks_all_components() {
        let mut s = InterestScore::new("t");
        s.recency = 1.0;
        s.frequency = 1.0;
        s.depth = 1.0;
        s.novelty = 1.0;
        s.decay(1.0);
        assert!((s.recency - 0.95).abs() < 1e-4);
    }

    #[test]
    fn prune_threshold() {
        let mut s = InterestScore::new("t");
        s.novelty = 0.0;
        assert!(s.should_prune());
        s.recency = 1.0;
        s.frequency = 1.0;
        s.depth = 1.0;
        s.novelty = 1.0;
        assert!(!s.should_prune());
    }
}
