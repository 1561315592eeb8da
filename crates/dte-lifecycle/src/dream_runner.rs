//! The narrow collaborator the lifecycle state machine invokes on
//! entering `Dreaming`. The dream consolidator implements this.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct DreamOutcome {
    pub patterns_formed: usize,
}

#[async_trait]
pub trait DreamRunner: Send + Sync {
    async fn run(&self, episodes_since_last_dream: u64) -> DreamOutcome;
}

/// A no-op runner, useful for tests and for running the lifecycle before
/// the consolidator is wired in.
pub struct NullDreamRunner;

#[async_trait]
impl DreamRunner for NullDreamRunner {
    async fn run(&self, _episodes_since_last_dream: u64) -> DreamOutcome {
        DreamOutcome::default()
    }
}
