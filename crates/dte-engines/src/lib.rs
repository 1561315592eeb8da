//! Concurrent cognitive engines (§4.2).
//!
//! `N` engines run independently, phase-offset across a 12-step
//! sub-cycle (relevance realization, affordance interaction, salience
//! simulation), folding their results into state shared across the
//! whole pool.

pub mod engine;
pub mod history;
pub mod metrics;
pub mod pool;
pub mod shared;

pub use engine::{step_kind, Engine, EngineState, StepKind};
pub use history::{TaskHistory, TaskRecord};
pub use metrics::{EngineMetrics, EnginePoolMetrics};
pub use pool::EnginePool;
pub use shared::{FutureScenario, PerformanceRecord, PresentCommitment, SharedCognition};
