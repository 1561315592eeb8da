//! Interest map: per-topic scores, pruned once they decay below threshold.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dte_types::InterestScore;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InterestMap {
    scores: Arc<RwLock<HashMap<String, InterestScore>>>,
}

impl InterestMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `UpdateInterest`: records an interaction with `topic`, creating its
    /// score if this is the first time it has come up.
    pub async fn update_interest(&self, topic: &str, content_len: usize) {
        let mut scores = self.scores.write().await;
        let entry = scores
            .entry(topic.to_string())
            .or_insert_with(|| InterestScore::new(topic));
        let age_days = (Utc::now() - entry.last_updated).num_seconds() as f32 / 86_400.0;
        entry.record_interaction(content_len, age_days.max(0.0));
    }

    pub async fn score_of(&self, topic: &str) -> f32 {
        self.scores.read().await.get(topic).map(|s| s.score()).unwrap_or(0.0)
    }

    pub async fn top(&self, n: usize) -> Vec<InterestScore> {
        let mut scores: Vec<_> = self.scores.read().await.values().cloned().collect();
        scores.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap());
        scores.truncate(n);
        scores
    }

    /// Applies daily decay to every tracked topic and drops any that fall
    /// below the prune threshold.
    pub async fn decay_all(&self, days: f32) {
        let mut scores = self.scores.write().await;
        for score in scores.values_mut() {
            score.decay(days);
        }
        scores.retain(|_, s| !s.should_prune());
    }

    pub async fn topic_count(&self) -> usize {
        self.scores.read().await.len()
    }

    /// Full snapshot for checkpointing.
    pub async fn snapshot(&self) -> HashMap<String, InterestScore> {
        self.scores.read().await.clone()
    }

    /// Repopulates the map from a restored checkpoint, replacing any
    /// existing entries.
    pub async fn restore(&self, scores: HashMap<String, InterestScore>) {
        *self.scores.write().await = scores;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_interest_creates_and_scores_a_topic() {
        let map = InterestMap::new();
        map.update_interest("rust", 300).await;
        assert!(map.score_of("rust").await > 0.0);
    }

    #[tokio::test]
    async fn decay_prunes_stale_topics() {
        let map = InterestMap::new();
        map.update_interest("ephemeral", 10).await;
        map.decay_all(365.0).await;
        assert_eq!(map.topic_count().await, 0);
    }

    #[tokio::test]
    async fn top_orders_by_score_descending() {
        let map = InterestMap::new();
        map.update_interest("a", 10).await;
        map.update_interest("b", 500).await;
        let top = map.top(2).await;
        assert_eq!(top[0].topic, "b");
    }
}
