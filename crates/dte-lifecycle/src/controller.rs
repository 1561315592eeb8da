//! The wake/rest/dream state machine (§4.5). Runs its own heartbeat
//! loop, deriving transitions from `VitalSigns` rather than external
//! triggers, and publishes `StateTransition`/`DreamStarted`/`DreamEnded`
//! on the bus as side effects of entering each state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dte_config::LifecycleConfig;
use dte_events::EventBus;
use dte_events::EventPayload;
use dte_types::{LifecycleState, VitalSigns};
use tokio::sync::{watch, RwLock};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::dream_runner::DreamRunner;

pub struct LifecycleController {
    cfg: LifecycleConfig,
    active_engines: u32,
    vitals: Arc<RwLock<VitalSigns>>,
    cycles_since_rest: AtomicU64,
    episodes_since_dream: AtomicU64,
    state_tx: watch::Sender<LifecycleState>,
    clock_active_tx: watch::Sender<bool>,
}

impl LifecycleController {
    pub fn new(cfg: LifecycleConfig, active_engines: u32) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Initializing);
        let (clock_active_tx, _) = watch::channel(false);
        Self {
            cfg,
            active_engines,
            vitals: Arc::new(RwLock::new(VitalSigns::fresh())),
            cycles_since_rest: AtomicU64::new(0),
            episodes_since_dream: AtomicU64::new(0),
            state_tx,
            clock_active_tx,
        }
    }

    pub fn state_rx(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    pub fn clock_active_rx(&self) -> watch::Receiver<bool> {
        self.clock_active_tx.subscribe()
    }

    pub async fn vitals(&self) -> VitalSigns {
        *self.vitals.read().await
    }

    /// Installs vital signs recovered from a checkpoint, before `run`
    /// starts its own heartbeat.
    pub async fn restore_vitals(&self, vitals: VitalSigns) {
        *self.vitals.write().await = vitals;
    }

    pub fn note_episode(&self) {
        self.episodes_since_dream.fetch_add(1, Ordering::SeqCst);
    }

    fn set_state(&self, state: LifecycleState) {
        let _ = self.state_tx.send(state);
    }

    /// Drives the machine from `Initializing` until `stop` reports
    /// `true`, at which point it publishes one final transition to
    /// `Stopped` and returns.
    pub async fn run(
        &self,
        bus: EventBus,
        dream_runner: Arc<dyn DreamRunner>,
        mut stop: watch::Receiver<bool>,
    ) {
        self.enter_awake(&bus).await;

        loop {
            if *stop.borrow() {
                self.shut_down(&bus).await;
                return;
            }

            let current = *self.state_tx.borrow();
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        self.shut_down(&bus).await;
                        return;
                    }
                }
                _ = self.step(current, &bus, dream_runner.clone()) => {}
            }
        }
    }

    async fn step(&self, current: LifecycleState, bus: &EventBus, dream_runner: Arc<dyn DreamRunner>) {
        match current {
            LifecycleState::Initializing | LifecycleState::Stopped => {
                sleep(self.cfg.heartbeat_interval).await;
            }
            LifecycleState::Awake => self.run_awake_heartbeat(bus).await,
            LifecycleState::Tiring => self.run_tiring(bus).await,
            LifecycleState::Resting => self.run_resting_heartbeat(bus, dream_runner).await,
            LifecycleState::Dreaming => {
                // Dreaming is entered and fully driven by `enter_dreaming`;
                // reaching this arm means a stray heartbeat raced the
                // transition, so just yield.
                sleep(self.cfg.heartbeat_interval).await;
            }
            LifecycleState::Transitioning => self.run_transitioning(bus).await,
        }
    }

    async fn run_awake_heartbeat(&self, bus: &EventBus) {
        sleep(self.cfg.heartbeat_interval).await;
        let mut vitals = self.vitals.write().await;
        vitals.apply_active_load(self.active_engines);
        let energy = vitals.energy;
        let fatigue = vitals.fatigue;
        drop(vitals);

        let cycles = self.cycles_since_rest.fetch_add(1, Ordering::SeqCst) + 1;
        if energy < self.cfg.energy_low || fatigue > self.cfg.fatigue_high || cycles >= self.cfg.cycles_since_rest_max
        {
            debug!(energy, fatigue, cycles, "transitioning to tiring");
            self.transition(bus, LifecycleState::Tiring).await;
        }
    }

    async fn run_tiring(&self, bus: &EventBus) {
        sleep(self.cfg.tiring_settle).await;
        self.enter_resting(bus).await;
    }

    async fn run_resting_heartbeat(&self, bus: &EventBus, dream_runner: Arc<dyn DreamRunner>) {
        sleep(self.cfg.heartbeat_interval).await;
        let mut vitals = self.vitals.write().await;
        vitals.apply_rest();
        let (energy, fatigue) = (vitals.energy, vitals.fatigue);
        drop(vitals);

        if self.episodes_since_dream.load(Ordering::SeqCst) > 0 {
            self.enter_dreaming(bus, dream_runner).await;
            return;
        }

        let circadian_ok = true;
        if energy > self.cfg.resting_energy_high && fatigue < self.cfg.resting_fatigue_low && circadian_ok {
            self.transition(bus, LifecycleState::Transitioning).await;
        }
    }

    async fn run_transitioning(&self, bus: &EventBus) {
        sleep(self.cfg.transitioning_duration).await;
        self.enter_awake(bus).await;
    }

    async fn transition(&self, bus: &EventBus, to: LifecycleState) {
        let from = *self.state_tx.borrow();
        self.set_state(to);
        bus.publish(EventPayload::StateTransition { from, to }).await;
    }

    async fn enter_awake(&self, bus: &EventBus) {
        let from = *self.state_tx.borrow();
        self.cycles_since_rest.store(0, Ordering::SeqCst);
        let _ = self.clock_active_tx.send(true);
        self.set_state(LifecycleState::Awake);
        bus.publish(EventPayload::StateTransition {
            from,
            to: LifecycleState::Awake,
        })
        .await;
        info!("entered Awake");
    }

    async fn enter_resting(&self, bus: &EventBus) {
        let from = *self.state_tx.borrow();
        let _ = self.clock_active_tx.send(false);
        self.set_state(LifecycleState::Resting);
        bus.publish(EventPayload::StateTransition {
            from,
            to: LifecycleState::Resting,
        })
        .await;
        info!("entered Resting: clock and thought stream paused");
    }

    async fn enter_dreaming(&self, bus: &EventBus, dream_runner: Arc<dyn DreamRunner>) {
        let from = *self.state_tx.borrow();
        self.set_state(LifecycleState::Dreaming);
        bus.publish(EventPayload::StateTransition {
            from,
            to: LifecycleState::Dreaming,
        })
        .await;
        bus.publish(EventPayload::DreamStarted).await;

        let episodes = self.episodes_since_dream.swap(0, Ordering::SeqCst);
        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.cfg.dream_max, dream_runner.run(episodes)).await {
            Ok(outcome) => outcome,
            Err(_) => crate::dream_runner::DreamOutcome::default(),
        };
        let elapsed = start.elapsed();
        if elapsed < self.cfg.dream_min {
            sleep(self.cfg.dream_min - elapsed).await;
        }

        bus.publish(EventPayload::DreamEnded {
            patterns_formed: outcome.patterns_formed,
        })
        .await;
        self.set_state(LifecycleState::Resting);
        info!(patterns_formed = outcome.patterns_formed, "dream ended, resumed Resting");
    }

    async fn shut_down(&self, bus: &EventBus) {
        let from = *self.state_tx.borrow();
        let _ = self.clock_active_tx.send(false);
        self.set_state(LifecycleState::Stopped);
        bus.publish(EventPayload::StateTransition {
            from,
            to: LifecycleState::Stopped,
        })
        .await;
        info!("lifecycle stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_cfg() -> LifecycleConfig {
        LifecycleConfig {
            energy_low: 0.3,
            fatigue_high: 0.7,
            cycles_since_rest_max: 2,
            tiring_settle: Duration::from_millis(1),
            dream_min: Duration::from_millis(1),
            dream_max: Duration::from_millis(20),
            resting_energy_high: 0.6,
            resting_fatigue_low: 0.4,
            transitioning_duration: Duration::from_millis(1),
            heartbeat_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn enter_awake_sets_clock_active() {
        let controller = LifecycleController::new(fast_cfg(), 3);
        let bus = EventBus::new(8);
        controller.enter_awake(&bus).await;
        assert!(*controller.clock_active_rx().borrow());
        assert_eq!(*controller.state_rx().borrow(), LifecycleState::Awake);
    }

    #[tokio::test]
    async fn resting_halts_clock() {
        let controller = LifecycleController::new(fast_cfg(), 3);
        let bus = EventBus::new(8);
        controller.enter_awake(&bus).await;
        controller.enter_resting(&bus).await;
        assert!(!*controller.clock_active_rx().borrow());
        assert_eq!(*controller.state_rx().borrow(), LifecycleState::Resting);
    }

    #[tokio::test]
    async fn dreaming_invokes_runner_and_returns_to_resting() {
        struct CountingRunner(Arc<std::sync::atomic::AtomicUsize>);
        #[async_trait::async_trait]
        impl DreamRunner for CountingRunner {
            async fn run(&self, _episodes: u64) -> crate::dream_runner::DreamOutcome {
                self.0.fetch_add(1, Ordering::SeqCst);
                crate::dream_runner::DreamOutcome { patterns_formed: 2 }
            }
        }

        let controller = LifecycleController::new(fast_cfg(), 3);
        let bus = EventBus::new(8);
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        controller.note_episode();
        controller
            .enter_dreaming(&bus, Arc::new(CountingRunner(calls.clone())))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*controller.state_rx().borrow(), LifecycleState::Resting);
    }
}
