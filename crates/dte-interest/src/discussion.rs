//! Active discussion tracking: initiation, turn-taking, and termination
//! (§4.7).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dte_config::{InterestConfig, ProviderConfig};
use dte_events::{EventBus, EventPayload};
use dte_llm::{generate_with_retry, GenerateOpts, Provider};
use tokio::sync::RwLock;
use tracing::warn;

const MAX_TURNS: usize = 5;

#[derive(Debug, Clone)]
pub struct Discussion {
    pub id: String,
    pub topic: String,
    pub interest_level: f32,
    pub last_activity: DateTime<Utc>,
    pub turns: VecDeque<String>,
}

impl Discussion {
    fn new(id: String, topic: String, interest_level: f32) -> Self {
        Self {
            id,
            topic,
            interest_level,
            last_activity: Utc::now(),
            turns: VecDeque::with_capacity(MAX_TURNS),
        }
    }

    fn push_turn(&mut self, turn: String) {
        if self.turns.len() == MAX_TURNS {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
        self.last_activity = Utc::now();
    }

    fn should_terminate(&self, cfg: &InterestConfig, fatigue: f32) -> bool {
        let inactive = Utc::now() - self.last_activity > chrono::Duration::from_std(cfg.discussion_inactivity_timeout).unwrap();
        inactive || self.interest_level < cfg.discussion_min_interest || fatigue > cfg.discussion_fatigue_limit
    }
}

#[derive(Clone, Default)]
pub struct DiscussionTracker {
    discussions: Arc<RwLock<HashMap<String, Discussion>>>,
}

impl DiscussionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_count(&self) -> usize {
        self.discussions.read().await.len()
    }

    pub async fn start(&self, id: impl Into<String>, topic: impl Into<String>, interest_level: f32) {
        let id = id.into();
        let discussion = Discussion::new(id.clone(), topic.into(), interest_level);
        self.discussions.write().await.insert(id, discussion);
    }

    pub async fn get(&self, id: &str) -> Option<Discussion> {
        self.discussions.read().await.get(id).cloned()
    }

    /// Applies one tick of interest decay to every active discussion and
    /// ends any that now meet a termination condition. Returns the ids of
    /// discussions that were ended.
    pub async fn tick(&self, cfg: &InterestConfig, fatigue: f32) -> Vec<String> {
        let mut discussions = self.discussions.write().await;
        for discussion in discussions.values_mut() {
            discussion.interest_level *= cfg.discussion_decay_per_tick;
        }
        let ended: Vec<String> = discussions
            .values()
            .filter(|d| d.should_terminate(cfg, fatigue))
            .map(|d| d.id.clone())
            .collect();
        for id in &ended {
            discussions.remove(id);
        }
        ended
    }

    /// Generates a response to `message` within discussion `id`, folding
    /// the last 5 turns into the prompt. On provider failure, emits a
    /// short fallback and keeps the discussion active.
    pub async fn respond(
        &self,
        id: &str,
        message: &str,
        provider: &dyn Provider,
        provider_cfg: &ProviderConfig,
    ) -> Option<String> {
        let context = {
            let discussions = self.discussions.read().await;
            discussions.get(id)?.turns.iter().cloned().collect::<Vec<_>>().join("\n")
        };
        let prompt = format!("{context}\nUser: {message}\nRespond in one short reply.");
        let opts = GenerateOpts {
            temperature: 0.8,
            max_tokens: 120,
        };

        let reply = match generate_with_retry(provider, &prompt, opts, provider_cfg).await {
            Ok(text) => text,
            Err(err) => {
                warn!("discussion response failed, using fallback: {err}");
                "Sorry, I'm having trouble finding the words for that right now.".to_string()
            }
        };

        let mut discussions = self.discussions.write().await;
        if let Some(discussion) = discussions.get_mut(id) {
            discussion.push_turn(format!("User: {message}"));
            discussion.push_turn(format!("Assistant: {reply}"));
        }
        Some(reply)
    }
}

/// Every `initiation_interval` while Awake, if a strong enough interest
/// exists and fatigue/active-discussion caps allow it, starts a new
/// discussion and publishes `ConversationDetected` with an LLM opener.
pub async fn maybe_initiate(
    tracker: &DiscussionTracker,
    interests: &crate::scoring::InterestMap,
    cfg: &InterestConfig,
    fatigue: f32,
    provider: &dyn Provider,
    provider_cfg: &ProviderConfig,
    bus: &EventBus,
) {
    if fatigue >= cfg.initiation_max_fatigue {
        return;
    }
    if tracker.active_count().await >= cfg.max_active_discussions {
        return;
    }
    let top = interests.top(1).await;
    let Some(top_interest) = top.into_iter().next() else {
        return;
    };
    if top_interest.score() < cfg.initiation_min_interest {
        return;
    }

    let prompt = format!("Write a brief, curious conversation opener about {}.", top_interest.topic);
    let opener = match generate_with_retry(provider, &prompt, GenerateOpts::new(0.8, 80), provider_cfg).await {
        Ok(text) => text,
        Err(err) => {
            warn!("initiation opener failed: {err}");
            format!("I've been thinking about {}. Want to talk about it?", top_interest.topic)
        }
    };

    let conversation_id = format!("conv-{}", top_interest.topic);
    tracker.start(conversation_id.clone(), top_interest.topic.clone(), top_interest.score()).await;
    bus.publish(EventPayload::ConversationDetected {
        conversation_id,
        opener,
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_llm::MockProvider;
    use std::time::Duration;

    fn cfg() -> InterestConfig {
        InterestConfig {
            base_threshold: 0.4,
            resting_threshold: 0.7,
            fatigue_refuse: 0.8,
            wisdom_discount_level: 0.5,
            wisdom_discount_factor: 0.9,
            initiation_interval: Duration::from_secs(20),
            initiation_min_interest: 0.7,
            initiation_max_fatigue: 0.5,
            max_active_discussions: 3,
            discussion_inactivity_timeout: Duration::from_secs(300),
            discussion_decay_per_tick: 0.98,
            discussion_min_interest: 0.3,
            discussion_fatigue_limit: 0.8,
            queue_cap: 100,
        }
    }

    fn provider_cfg() -> ProviderConfig {
        ProviderConfig {
            deadline: Duration::from_secs(1),
            max_retries: 0,
            backoff_base: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn tick_ends_discussions_below_min_interest() {
        let tracker = DiscussionTracker::new();
        tracker.start("d1", "rust", 0.31).await;
        let cfg = cfg();
        for _ in 0..5 {
            tracker.tick(&cfg, 0.0).await;
        }
        assert!(tracker.get("d1").await.is_none());
    }

    #[tokio::test]
    async fn tick_ends_discussions_on_high_fatigue() {
        let tracker = DiscussionTracker::new();
        tracker.start("d1", "rust", 1.0).await;
        let ended = tracker.tick(&cfg(), 0.9).await;
        assert_eq!(ended, vec!["d1".to_string()]);
    }

    #[tokio::test]
    async fn respond_keeps_discussion_active_on_provider_error() {
        use dte_llm::FlakyProvider;
        let tracker = DiscussionTracker::new();
        tracker.start("d1", "rust", 0.9).await;
        let provider = FlakyProvider::new(1000);
        let reply = tracker.respond("d1", "hi", &provider, &provider_cfg()).await;
        assert!(reply.is_some());
        assert!(tracker.get("d1").await.is_some());
    }

    #[tokio::test]
    async fn initiation_skipped_when_no_strong_interest() {
        let tracker = DiscussionTracker::new();
        let interests = crate::scoring::InterestMap::new();
        let bus = EventBus::new(8);
        let provider = MockProvider;
        maybe_initiate(&tracker, &interests, &cfg(), 0.0, &provider, &provider_cfg(), &bus).await;
        assert_eq!(tracker.active_count().await, 0);
    }
}
