//! The Deep Tree Echo orchestrator: construction, restore, the control
//! surface, and the bus subscribers that keep cross-module bookkeeping in
//! sync.

pub mod context;
pub mod handlers;
pub mod orchestrator;
pub mod self_model;

pub use context::LiveContext;
pub use handlers::{DreamEndedHandler, ThoughtGeneratedHandler, WisdomGainedHandler};
pub use orchestrator::Orchestrator;
pub use self_model::{awareness, CoreMetrics, SelfModel, Status};
