//! Bus subscribers that keep cross-module counters and side effects in
//! sync: a thought updates the interest map and counts as an episode
//! toward the next dream; a completed dream and a new principle bump the
//! persisted counters.

use std::sync::Arc;

use async_trait::async_trait;
use dte_events::{Event, EventHandler, EventPayload};
use dte_interest::InterestMap;
use dte_lifecycle::LifecycleController;
use dte_types::Counters;
use tokio::sync::RwLock;

pub struct ThoughtGeneratedHandler {
    pub interests: InterestMap,
    pub lifecycle: Arc<LifecycleController>,
    pub counters: Arc<RwLock<Counters>>,
}

#[async_trait]
impl EventHandler for ThoughtGeneratedHandler {
    async fn handle(&self, event: Event) {
        if let EventPayload::ThoughtGenerated(thought) = event.payload {
            for tag in &thought.tags {
                self.interests.update_interest(tag, thought.content.len()).await;
            }
            self.lifecycle.note_episode();
            self.counters.write().await.thoughts_generated += 1;
        }
    }
}

pub struct DreamEndedHandler {
    pub counters: Arc<RwLock<Counters>>,
}

#[async_trait]
impl EventHandler for DreamEndedHandler {
    async fn handle(&self, event: Event) {
        if let EventPayload::DreamEnded { patterns_formed } = event.payload {
            let mut counters = self.counters.write().await;
            counters.dreams_completed += 1;
            counters.patterns_formed += patterns_formed as u64;
        }
    }
}

pub struct WisdomGainedHandler {
    pub counters: Arc<RwLock<Counters>>,
}

#[async_trait]
impl EventHandler for WisdomGainedHandler {
    async fn handle(&self, event: Event) {
        if let EventPayload::WisdomGained { .. } = event.payload {
            self.counters.write().await.principles_synthesized += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_config::LifecycleConfig;
    use dte_events::EventType;
    use dte_types::{ClockState, ThoughtKind, ThoughtSource};

    #[tokio::test]
    async fn thought_generated_updates_interest_and_counters() {
        let bus = dte_events::EventBus::new(8);
        let interests = InterestMap::new();
        let lifecycle = Arc::new(LifecycleController::new(LifecycleConfig::default(), 3));
        let counters = Arc::new(RwLock::new(Counters::default()));

        bus.subscribe(
            EventType::ThoughtGenerated,
            ThoughtGeneratedHandler {
                interests: interests.clone(),
                lifecycle: lifecycle.clone(),
                counters: counters.clone(),
            },
        )
        .await;

        let thought = dte_types::Thought::new(
            1,
            "pondering resonance",
            ThoughtKind::Observation,
            0.5,
            vec!["resonance".to_string()],
            ThoughtSource::Internal,
            ClockState::initial(),
        );
        bus.publish(EventPayload::ThoughtGenerated(thought)).await;
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;

        assert_eq!(counters.read().await.thoughts_generated, 1);
        assert!(interests.score_of("resonance").await > 0.0);
    }
}
