//! Snapshot types for engine introspection (`GetMetrics`).

use std::time::Duration;

use crate::engine::EngineState;

#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub id: usize,
    pub current_step: u32,
    pub state: EngineState,
    pub performance_ema: f32,
    pub cadence: Duration,
    pub history_len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EnginePoolMetrics {
    pub engines: Vec<EngineMetrics>,
}

impl EnginePoolMetrics {
    pub fn mean_performance(&self) -> f32 {
        if self.engines.is_empty() {
            return 0.0;
        }
        let total: f32 = self.engines.iter().map(|e| e.performance_ema).sum();
        total / self.engines.len() as f32
    }
}
