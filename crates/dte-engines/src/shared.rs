//! State shared across all cognitive engines (§4.2): each slot has at
//! most one writer at a time (the engine presently on the step that
//! owns it) and many readers, following the `Arc<RwLock<_>>` discipline
//! used throughout the corpus for cross-task shared state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Written by relevance-realization steps (1 and 7): "what matters now".
#[derive(Debug, Clone)]
pub struct PresentCommitment {
    pub statement: String,
    pub set_at: DateTime<Utc>,
    pub engine_id: usize,
}

/// Appended by affordance-interaction steps (2-6): a record of one
/// engine's interaction with its environment on a given step.
#[derive(Debug, Clone)]
pub struct PerformanceRecord {
    pub engine_id: usize,
    pub step: u32,
    pub summary: String,
    pub recorded_at: DateTime<Utc>,
}

/// Appended by salience-simulation steps (8-12): one imagined future
/// scenario with its estimated probability and desirability.
#[derive(Debug, Clone)]
pub struct FutureScenario {
    pub engine_id: usize,
    pub step: u32,
    pub description: String,
    pub probability: f32,
    pub desirability: f32,
    pub imagined_at: DateTime<Utc>,
}

/// The three shared slots engines read and write as they cycle through
/// the 12-step sub-cycle.
#[derive(Clone, Default)]
pub struct SharedCognition {
    present_commitment: Arc<RwLock<Option<PresentCommitment>>>,
    past_performance: Arc<RwLock<Vec<PerformanceRecord>>>,
    future_potential: Arc<RwLock<Vec<FutureScenario>>>,
}

const PERFORMANCE_CAP: usize = 256;
const SCENARIO_CAP: usize = 256;

impl SharedCognition {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_commitment(&self, commitment: PresentCommitment) {
        *self.present_commitment.write().await = Some(commitment);
    }

    pub async fn commitment(&self) -> Option<PresentCommitment> {
        self.present_commitment.read().await.clone()
    }

    pub async fn record_performance(&self, record: PerformanceRecord) {
        let mut guard = self.past_performance.write().await;
        guard.push(record);
        if guard.len() > PERFORMANCE_CAP {
            let overflow = guard.len() - PERFORMANCE_CAP;
            guard.drain(0..overflow);
        }
    }

    pub async fn recent_performance(&self, limit: usize) -> Vec<PerformanceRecord> {
        let guard = self.past_performance.read().await;
        guard.iter().rev().take(limit).cloned().collect()
    }

    pub async fn record_scenario(&self, scenario: FutureScenario) {
        let mut guard = self.future_potential.write().await;
        guard.push(scenario);
        if guard.len() > SCENARIO_CAP {
            let overflow = guard.len() - SCENARIO_CAP;
            guard.drain(0..overflow);
        }
    }

    pub async fn recent_scenarios(&self, limit: usize) -> Vec<FutureScenario> {
        let guard = self.future_potential.read().await;
        guard.iter().rev().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commitment_readers_see_latest_writer() {
        let shared = SharedCognition::new();
        assert!(shared.commitment().await.is_none());

        shared
            .set_commitment(PresentCommitment {
                statement: "attend to the user's question".into(),
                set_at: Utc::now(),
                engine_id: 0,
            })
            .await;
        shared
            .set_commitment(PresentCommitment {
                statement: "attend to the build failure".into(),
                set_at: Utc::now(),
                engine_id: 1,
            })
            .await;

        let seen = shared.commitment().await.unwrap();
        assert_eq!(seen.statement, "attend to the build failure");
        assert_eq!(seen.engine_id, 1);
    }

    #[tokio::test]
    async fn performance_log_caps_and_orders_most_recent_first() {
        let shared = SharedCognition::new();
        for i in 0..(PERFORMANCE_CAP + 10) {
            shared
                .record_performance(PerformanceRecord {
                    engine_id: 0,
                    step: (i % 12) as u32,
                    summary: format!("record {i}"),
                    recorded_at: Utc::now(),
                })
                .await;
        }
        let recent = shared.recent_performance(3).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].summary, format!("record {}", PERFORMANCE_CAP + 9));
    }
}
