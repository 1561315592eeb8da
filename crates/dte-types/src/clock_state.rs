//! `ClockState`: the derived snapshot of the 30-step cognitive cycle clock.

use serde::{Deserialize, Serialize};

/// Snapshot of the scheduler clock. `step` is always in `[1, 30]`; the rest
/// are derived from `step` (see `dte_clock` for the derivation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    pub step: u8,
    pub dyadic: u8,
    pub triadic: u8,
    pub stage: u8,
    pub fold_phase: u8,
}

impl ClockState {
    /// The state the clock starts in before the first `Advance()`.
    pub fn initial() -> Self {
        Self {
            step: 1,
            dyadic: 1,
            triadic: 1,
            stage: 1,
            fold_phase: 1,
        }
    }
}

impl Default for ClockState {
    fn default() -> Self {
        Self::initial()
    }
}
