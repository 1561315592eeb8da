//! Wake/rest/dream lifecycle state machine (§4.5).

pub mod controller;
pub mod dream_runner;

pub use controller::LifecycleController;
pub use dream_runner::{DreamOutcome, DreamRunner, NullDreamRunner};
