//! `LifecycleState`: the wake/rest/dream state machine's states.

use serde::{Deserialize, Serialize};

/// The six states of the wake/rest/dream lifecycle (§4.5), plus the
/// terminal `Stopped` state a cancellation signal drives the machine to.
/// `Stopped` is not one of the six cycling states in the transition graph;
/// it is reachable from any of them once and is not left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Initializing,
    Awake,
    Tiring,
    Resting,
    Dreaming,
    Transitioning,
    Stopped,
}

impl LifecycleState {
    /// Whether the clock and thought stream should run in this state.
    pub fn is_active(self) -> bool {
        matches!(self, LifecycleState::Awake | LifecycleState::Tiring)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Stopped)
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Initializing
    }
}
