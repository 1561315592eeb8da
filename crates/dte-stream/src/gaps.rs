//! Knowledge gaps: topics the stream has flagged as under-explored.
//! Feeds the `Question`/`Curiosity` gating in thought-type selection and
//! the prompt's "top-2 knowledge gaps" context.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct KnowledgeGap {
    pub topic: String,
    pub importance: f32,
    pub identified_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct KnowledgeGapTracker {
    gaps: Arc<RwLock<Vec<KnowledgeGap>>>,
}

impl KnowledgeGapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn note(&self, topic: impl Into<String>, importance: f32) {
        self.gaps.write().await.push(KnowledgeGap {
            topic: topic.into(),
            importance: importance.clamp(0.0, 1.0),
            identified_at: Utc::now(),
        });
    }

    pub async fn exists(&self) -> bool {
        !self.gaps.read().await.is_empty()
    }

    pub async fn top(&self, n: usize) -> Vec<KnowledgeGap> {
        let mut gaps = self.gaps.read().await.clone();
        gaps.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap());
        gaps.truncate(n);
        gaps
    }

    pub async fn resolve(&self, topic: &str) {
        self.gaps.write().await.retain(|g| g.topic != topic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn top_returns_highest_importance_first() {
        let tracker = KnowledgeGapTracker::new();
        tracker.note("a", 0.2).await;
        tracker.note("b", 0.9).await;
        tracker.note("c", 0.5).await;
        let top = tracker.top(2).await;
        assert_eq!(top[0].topic, "b");
        assert_eq!(top[1].topic, "c");
    }

    #[tokio::test]
    async fn exists_reflects_emptiness() {
        let tracker = KnowledgeGapTracker::new();
        assert!(!tracker.exists().await);
        tracker.note("x", 0.5).await;
        assert!(tracker.exists().await);
        tracker.resolve("x").await;
        assert!(!tracker.exists().await);
    }
}
