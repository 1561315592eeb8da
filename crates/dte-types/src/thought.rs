//! The `Thought` entity: an immutable record of one generated cognitive unit.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock_state::ClockState;
use crate::util::clamp01;

/// The kind of cognitive unit a `Thought` represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtKind {
    Observation,
    Question,
    Insight,
    Reflection,
    Planning,
    Curiosity,
    Connection,
    Wisdom,
    Perception,
}

impl ThoughtKind {
    /// The default importance associated with this kind, per the thought
    /// stream's type-selection table.
    pub fn default_importance(self) -> f32 {
        match self {
            ThoughtKind::Wisdom => 0.95,
            ThoughtKind::Insight => 0.85,
            ThoughtKind::Connection => 0.75,
            ThoughtKind::Question => 0.70,
            ThoughtKind::Reflection => 0.65,
            ThoughtKind::Planning => 0.60,
            ThoughtKind::Curiosity => 0.55,
            ThoughtKind::Observation => 0.50,
            ThoughtKind::Perception => 0.80,
        }
    }
}

/// Where a thought originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtSource {
    Internal,
    External,
}

/// An immutable record of one generated cognitive unit.
///
/// Invariants: `timestamp` is non-decreasing within a single engine;
/// `importance` is never negative (clamped to `[0,1]` on construction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    pub id: u64,
    pub content: String,
    pub kind: ThoughtKind,
    pub timestamp: DateTime<Utc>,
    pub importance: f32,
    pub tags: BTreeSet<String>,
    pub source: ThoughtSource,
    pub phase: ClockState,
    /// Set by persistence on restore; never set by live generation.
    #[serde(default)]
    pub restored: bool,
}

impl Thought {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        content: impl Into<String>,
        kind: ThoughtKind,
        importance: f32,
        tags: impl IntoIterator<Item = String>,
        source: ThoughtSource,
        phase: ClockState,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            kind,
            timestamp: Utc::now(),
            importance: clamp01(importance),
            tags: tags.into_iter().collect(),
            source,
            phase,
            restored: false,
        }
    }

    /// An episode boundary per §3: a thought qualifies for episode
    /// creation once its importance crosses 0.7.
    pub fn crosses_episode_threshold(&self) -> bool {
        self.importance >= 0.7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase() -> ClockState {
        ClockState::initial()
    }

    #[test]
    fn importance_is_clamped_on_construction() {
        let t = Thought::new(1, "x", ThoughtKind::Insight, 5.0, [], ThoughtSource::Internal, phase());
        assert_eq!(t.importance, 1.0);
        let t2 = Thought::new(2, "x", ThoughtKind::Insight, -5.0, [], ThoughtSource::Internal, phase());
        assert_eq!(t2.importance, 0.0);
    }

    #[test]
    fn serde_round_trip_preserves_fields() {
        let t = Thought::new(
            7,
            "hello",
            ThoughtKind::Wisdom,
            0.95,
            ["a".to_string(), "b".to_string()],
            ThoughtSource::External,
            phase(),
        );
        let json = serde_json::to_string(&t).unwrap();
        let back: Thought = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn episode_threshold() {
        let low = Thought::new(1, "x", ThoughtKind::Observation, 0.5, [], ThoughtSource::Internal, phase());
        let high = Thought::new(2, "x", ThoughtKind::Insight, 0.7, [], ThoughtSource::Internal, phase());
        assert!(!low.crosses_episode_threshold());
        assert!(high.crosses_episode_threshold());
    }
}
