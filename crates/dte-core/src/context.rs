//! `ContextSource` wired to the live interest map, goal queue, and vital
//! signs, so the thought stream's prompts reflect actual running state
//! rather than the stream crate's static test fixture.

use std::sync::Arc;

use async_trait::async_trait;
use dte_interest::InterestMap;
use dte_lifecycle::LifecycleController;
use dte_stream::ContextSource;
use dte_types::Goal;
use tokio::sync::RwLock;

pub struct LiveContext {
    interests: InterestMap,
    goals: Arc<RwLock<Vec<Goal>>>,
    lifecycle: Arc<LifecycleController>,
}

impl LiveContext {
    pub fn new(interests: InterestMap, goals: Arc<RwLock<Vec<Goal>>>, lifecycle: Arc<LifecycleController>) -> Self {
        Self {
            interests,
            goals,
            lifecycle,
        }
    }
}

#[async_trait]
impl ContextSource for LiveContext {
    async fn top_interests(&self, n: usize) -> Vec<String> {
        self.interests.top(n).await.into_iter().map(|s| s.topic).collect()
    }

    async fn active_goals(&self) -> Vec<String> {
        self.goals
            .read()
            .await
            .iter()
            .filter(|g| !g.achieved)
            .map(|g| g.description.clone())
            .collect()
    }

    async fn current_focus(&self) -> String {
        self.interests
            .top(1)
            .await
            .into_iter()
            .next()
            .map(|s| s.topic)
            .unwrap_or_else(|| "the present moment".to_string())
    }

    async fn current_mood(&self) -> String {
        let vitals = self.lifecycle.vitals().await;
        if vitals.emotional_balance > 0.7 {
            "content".to_string()
        } else if vitals.emotional_balance > 0.4 {
            "neutral".to_string()
        } else {
            "weary".to_string()
        }
    }
}
