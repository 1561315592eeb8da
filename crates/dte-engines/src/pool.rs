//! Spawns and supervises the fixed pool of concurrent cognitive engines
//! (§4.2: `N >= 3` engines, phase-offset so they occupy different steps
//! of the 12-step sub-cycle at any given moment).

use std::sync::Arc;

use dte_config::ClockConfig;
use dte_llm::Provider;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::engine::Engine;
use crate::metrics::{EngineMetrics, EnginePoolMetrics};
use crate::shared::SharedCognition;

pub struct EnginePool {
    engines: Vec<Engine>,
    shared: SharedCognition,
    stop_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl EnginePool {
    /// Builds the pool's engines without starting them; call `spawn` to
    /// start the per-engine loops.
    pub fn build(cfg: &ClockConfig) -> Self {
        let engines = cfg
            .engine_offsets
            .iter()
            .enumerate()
            .map(|(id, &offset)| Engine::new(id, offset, cfg.engine_history_cap, cfg.engine_min_cadence))
            .collect();
        let (stop_tx, _) = watch::channel(false);
        Self {
            engines,
            shared: SharedCognition::new(),
            stop_tx,
            handles: Vec::new(),
        }
    }

    pub fn shared(&self) -> SharedCognition {
        self.shared.clone()
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    /// Starts every engine's run loop. `clock_active` is flipped by the
    /// lifecycle controller on entering/exiting Resting or Dreaming.
    pub fn spawn(
        &mut self,
        provider: Arc<dyn Provider>,
        provider_cfg: dte_config::ProviderConfig,
        clock_active: watch::Receiver<bool>,
        cadence_bounds: (std::time::Duration, std::time::Duration),
    ) {
        for engine in &self.engines {
            let engine = engine.clone();
            let shared = self.shared.clone();
            let provider = provider.clone();
            let provider_cfg = provider_cfg.clone();
            let clock_active = clock_active.clone();
            let stop_rx = self.stop_tx.subscribe();
            let handle = tokio::spawn(async move {
                engine
                    .run(shared, provider, provider_cfg, clock_active, stop_rx, cadence_bounds)
                    .await;
            });
            self.handles.push(handle);
        }
        info!(count = self.engines.len(), "engine pool spawned");
    }

    /// Signals every engine to stop and waits for their loops to exit.
    pub async fn shutdown(&mut self) {
        let _ = self.stop_tx.send(true);
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }

    pub async fn metrics(&self) -> EnginePoolMetrics {
        let mut engines = Vec::with_capacity(self.engines.len());
        for engine in &self.engines {
            engines.push(EngineMetrics {
                id: engine.id(),
                current_step: engine.current_step().await,
                state: engine.state().await,
                performance_ema: engine.performance_ema().await,
                cadence: engine.cadence().await,
                history_len: engine.history_len().await,
            });
        }
        EnginePoolMetrics { engines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engines_start_at_distinct_offsets() {
        let cfg = ClockConfig {
            engine_offsets: vec![0, 4, 8],
            ..ClockConfig::default()
        };
        let pool = EnginePool::build(&cfg);
        assert_eq!(pool.engines().len(), 3);
    }

    #[tokio::test]
    async fn shutdown_without_spawn_is_a_no_op() {
        let cfg = ClockConfig::default();
        let mut pool = EnginePool::build(&cfg);
        pool.shutdown().await;
    }
}
