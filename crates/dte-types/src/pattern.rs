//! The `Pattern` entity: a recurring theme extracted from episodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clamp01;

/// A recurring theme extracted from episodes.
///
/// Invariants: `frequency` is monotonically non-decreasing; `strength` is
/// updated only by the dream consolidator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: Uuid,
    pub description: String,
    pub frequency: u32,
    pub strength: f32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub example_ids: Vec<u64>,
    pub tags: Vec<String>,
}

impl Pattern {
    pub fn new(description: impl Into<String>, tags: Vec<String>, example_id: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            frequency: 1,
            strength: 0.0,
            first_seen: now,
            last_seen: now,
            example_ids: vec![example_id],
            tags,
        }
    }

    /// Records another occurrence of this theme. `frequency` never
    /// decreases; `last_seen` advances; `strength` is set by the caller
    /// (the consolidator owns strength updates).
    pub fn record_occurrence(&mut self, example_id: u64, strength: f32) {
        self.frequency += 1;
        self.last_seen = Utc::now();
        self.example_ids.push(example_id);
        self.strength = clamp01(strength);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_never_decreases() {
        let mut p = Pattern::new("resonance", vec!["resonance".into()], 1);
        assert_eq!(p.frequency, 1);
        p.record_occurrence(2, 0.5);
        p.record_occurrence(3, 0.6);
        assert_eq!(p.frequency, 3);
        assert_eq!(p.example_ids, vec![1, 2, 3]);
    }

    #[test]
    fn strength_clamped() {
        let mut p = Pattern::new("x", vec![], 1);
        p.record_occurrence(2, 3.0);
        assert_eq!(p.strength, 1.0);
    }
}
