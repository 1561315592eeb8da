//! The `Episode` entity: an ordered sequence of thought IDs bundled for
//! consolidation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clamp01;

/// An ordered sequence of thought IDs with an aggregate importance and a
/// context string.
///
/// Lifecycle: created -> stored by consolidator -> immutable. Once
/// `consolidated` is set it is never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub thought_ids: Vec<u64>,
    pub aggregate_importance: f32,
    pub context: String,
    pub created_at: DateTime<Utc>,
    pub consolidated: bool,
}

impl Episode {
    pub fn new(thought_ids: Vec<u64>, aggregate_importance: f32, context: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            thought_ids,
            aggregate_importance: clamp01(aggregate_importance),
            context: context.into(),
            created_at: Utc::now(),
            consolidated: false,
        }
    }

    pub fn mark_consolidated(&mut self) {
        self.consolidated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_episode_starts_unconsolidated() {
        let e = Episode::new(vec![1, 2, 3], 0.8, "resonance cluster");
        assert!(!e.consolidated);
        assert_eq!(e.thought_ids.len(), 3);
    }

    #[test]
    fn mark_consolidated_is_one_way() {
        let mut e = Episode::new(vec![1], 0.9, "ctx");
        e.mark_consolidated();
        assert!(e.consolidated);
    }
}
