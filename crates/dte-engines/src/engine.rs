//! A single cognitive engine: an async task that walks the 12-step
//! sub-cycle, calling out to a `Provider` on each step and folding the
//! result into the cognition shared across all engines (§4.2).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dte_config::ProviderConfig;
use dte_llm::{generate_with_retry, GenerateOpts, Provider};
use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};

use crate::history::{TaskHistory, TaskRecord};
use crate::shared::{FutureScenario, PerformanceRecord, PresentCommitment, SharedCognition};

const EMA_ALPHA: f32 = 0.2;
const CADENCE_BACKOFF_EMA: f32 = 0.3;
const CADENCE_TIGHTEN_EMA: f32 = 0.8;
const CADENCE_BACKOFF_FACTOR: f64 = 1.5;
const CADENCE_TIGHTEN_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Processing,
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    RelevanceRealization,
    AffordanceInteraction,
    SalienceSimulation,
}

pub fn step_kind(step: u32) -> StepKind {
    match step {
        1 | 7 => StepKind::RelevanceRealization,
        2..=6 => StepKind::AffordanceInteraction,
        8..=12 => StepKind::SalienceSimulation,
        other => panic!("sub-cycle step out of range: {other}"),
    }
}

fn temperature_for(kind: StepKind) -> f32 {
    match kind {
        StepKind::RelevanceRealization => 0.7,
        StepKind::AffordanceInteraction => 0.6,
        StepKind::SalienceSimulation => 0.8,
    }
}

struct Inner {
    id: usize,
    current_step: RwLock<u32>,
    state: RwLock<EngineState>,
    history: RwLock<TaskHistory>,
    performance_ema: RwLock<f32>,
    cadence: RwLock<Duration>,
}

/// Cheaply cloneable handle to one engine's state; the running loop and
/// any metrics reader share the same `Arc`.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    pub fn new(id: usize, offset: u32, history_cap: usize, initial_cadence: Duration) -> Self {
        let current_step = (offset % 12) + 1;
        Self {
            inner: Arc::new(Inner {
                id,
                current_step: RwLock::new(current_step),
                state: RwLock::new(EngineState::Idle),
                history: RwLock::new(TaskHistory::new(history_cap)),
                performance_ema: RwLock::new(1.0),
                cadence: RwLock::new(initial_cadence),
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.inner.id
    }

    pub async fn current_step(&self) -> u32 {
        *self.inner.current_step.read().await
    }

    pub async fn state(&self) -> EngineState {
        *self.inner.state.read().await
    }

    pub async fn performance_ema(&self) -> f32 {
        *self.inner.performance_ema.read().await
    }

    pub async fn cadence(&self) -> Duration {
        *self.inner.cadence.read().await
    }

    pub async fn history_len(&self) -> usize {
        self.inner.history.read().await.len()
    }

    async fn set_state(&self, state: EngineState) {
        *self.inner.state.write().await = state;
    }

    /// Runs until `stop` is set to `true`. Steps only advance while
    /// `clock_active` reads `true`; while it is `false` the engine sits
    /// in `Waiting` and `current_step` does not change (§4.2 invariant).
    pub async fn run(
        &self,
        shared: SharedCognition,
        provider: Arc<dyn Provider>,
        provider_cfg: ProviderConfig,
        mut clock_active: watch::Receiver<bool>,
        mut stop: watch::Receiver<bool>,
        cadence_bounds: (Duration, Duration),
    ) {
        loop {
            let sleep_for = self.cadence().await;
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        debug!(engine = self.id(), "engine stopping");
                        return;
                    }
                }
                _ = tokio::time::sleep(sleep_for) => {
                    if !*clock_active.borrow() {
                        self.set_state(EngineState::Waiting).await;
                        continue;
                    }
                    self.execute_current_step(&shared, provider.as_ref(), &provider_cfg, cadence_bounds)
                        .await;
                }
                _ = clock_active.changed() => {
                    // re-evaluate immediately on the next loop iteration
                }
            }
        }
    }

    async fn execute_current_step(
        &self,
        shared: &SharedCognition,
        provider: &dyn Provider,
        provider_cfg: &ProviderConfig,
        cadence_bounds: (Duration, Duration),
    ) {
        self.set_state(EngineState::Processing).await;
        let step = self.current_step().await;
        let kind = step_kind(step);
        let prompt = self.prompt_for(kind, shared).await;
        let opts = GenerateOpts {
            temperature: temperature_for(kind),
            max_tokens: 256,
        };

        let outcome = generate_with_retry(provider, &prompt, opts, provider_cfg).await;
        let succeeded = outcome.is_ok();

        match &outcome {
            Ok(text) => self.fold_result(kind, step, text, shared).await,
            Err(err) => warn!(engine = self.id(), step, "engine step failed: {err}"),
        }

        self.inner.history.write().await.push(TaskRecord {
            step,
            description: format!("{kind:?} @ step {step}"),
            completed_at: Utc::now(),
            succeeded,
        });

        self.update_ema_and_cadence(succeeded, cadence_bounds).await;
        let next = step % 12 + 1;
        *self.inner.current_step.write().await = next;
        self.set_state(EngineState::Idle).await;
    }

    async fn prompt_for(&self, kind: StepKind, shared: &SharedCognition) -> String {
        match kind {
            StepKind::RelevanceRealization => "What matters now, given recent performance and imagined futures?".to_string(),
            StepKind::AffordanceInteraction => {
                let commitment = shared
                    .commitment()
                    .await
                    .map(|c| c.statement)
                    .unwrap_or_else(|| "nothing in particular".to_string());
                format!("Given the present commitment '{commitment}', what affordance should be engaged?")
            }
            StepKind::SalienceSimulation => {
                let recent = shared.recent_performance(3).await;
                let summary = recent
                    .iter()
                    .map(|r| r.summary.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("Given recent performance ({summary}), imagine a plausible near-term future.")
            }
        }
    }

    async fn fold_result(&self, kind: StepKind, step: u32, text: &str, shared: &SharedCognition) {
        match kind {
            StepKind::RelevanceRealization => {
                shared
                    .set_commitment(PresentCommitment {
                        statement: text.to_string(),
                        set_at: Utc::now(),
                        engine_id: self.id(),
                    })
                    .await;
            }
            StepKind::AffordanceInteraction => {
                shared
                    .record_performance(PerformanceRecord {
                        engine_id: self.id(),
                        step,
                        summary: text.to_string(),
                        recorded_at: Utc::now(),
                    })
                    .await;
            }
            StepKind::SalienceSimulation => {
                shared
                    .record_scenario(FutureScenario {
                        engine_id: self.id(),
                        step,
                        description: text.to_string(),
                        probability: 0.5,
                        desirability: 0.5,
                        imagined_at: Utc::now(),
                    })
                    .await;
            }
        }
    }

    async fn update_ema_and_cadence(&self, succeeded: bool, bounds: (Duration, Duration)) {
        let sample = if succeeded { 1.0 } else { 0.0 };
        let mut ema_guard = self.inner.performance_ema.write().await;
        *ema_guard = *ema_guard * (1.0 - EMA_ALPHA) + sample * EMA_ALPHA;
        let ema = *ema_guard;
        drop(ema_guard);

        let (min_cadence, max_cadence) = bounds;
        let mut cadence_guard = self.inner.cadence.write().await;
        let current = *cadence_guard;
        let adjusted = if ema < CADENCE_BACKOFF_EMA {
            current.mul_f64(CADENCE_BACKOFF_FACTOR)
        } else if ema > CADENCE_TIGHTEN_EMA {
            current.mul_f64(CADENCE_TIGHTEN_FACTOR)
        } else {
            current
        };
        *cadence_guard = adjusted.clamp(min_cadence, max_cadence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_llm::MockProvider;

    fn cfg() -> ProviderConfig {
        ProviderConfig {
            deadline: Duration::from_secs(5),
            max_retries: 1,
            backoff_base: Duration::from_millis(1),
        }
    }

    #[test]
    fn step_kind_partitions_the_sub_cycle() {
        assert_eq!(step_kind(1), StepKind::RelevanceRealization);
        assert_eq!(step_kind(7), StepKind::RelevanceRealization);
        for step in 2..=6 {
            assert_eq!(step_kind(step), StepKind::AffordanceInteraction);
        }
        for step in 8..=12 {
            assert_eq!(step_kind(step), StepKind::SalienceSimulation);
        }
    }

    #[tokio::test]
    async fn offset_determines_starting_step() {
        let engine = Engine::new(0, 4, 64, Duration::from_millis(1));
        assert_eq!(engine.current_step().await, 5);
    }

    #[tokio::test]
    async fn step_advances_and_wraps_after_execution() {
        let engine = Engine::new(0, 11, 64, Duration::from_millis(1));
        assert_eq!(engine.current_step().await, 12);
        let shared = SharedCognition::new();
        let provider = Arc::new(MockProvider::default());
        engine
            .execute_current_step(&shared, provider.as_ref(), &cfg(), (Duration::from_millis(1), Duration::from_secs(1)))
            .await;
        assert_eq!(engine.current_step().await, 1);
        assert_eq!(engine.history_len().await, 1);
    }

    #[tokio::test]
    async fn successful_step_raises_ema_toward_one() {
        let engine = Engine::new(0, 0, 64, Duration::from_millis(1));
        *engine.inner.performance_ema.write().await = 0.5;
        engine
            .update_ema_and_cadence(true, (Duration::from_millis(1), Duration::from_secs(1)))
            .await;
        assert!(engine.performance_ema().await > 0.5);
    }

    #[tokio::test]
    async fn low_ema_backs_off_cadence_within_bounds() {
        let engine = Engine::new(0, 0, 64, Duration::from_millis(500));
        *engine.inner.performance_ema.write().await = 0.1;
        let bounds = (Duration::from_millis(500), Duration::from_millis(800));
        engine.update_ema_and_cadence(false, bounds).await;
        let cadence = engine.cadence().await;
        assert!(cadence > Duration::from_millis(500));
        assert!(cadence <= Duration::from_millis(800));
    }
}
