//! The 30-step cognitive clock: μ ∘ Δ₂ ∘ Δ₃ ∘ φ ∘ σ.
//!
//! `step` advances modulo 30 at a fixed cadence. Every derived phase
//! (dyadic Δ₂, triadic Δ₃, stage σ, fold φ) is a pure function of `step`;
//! `Clock` itself only owns the current step and whether advancement is
//! currently paused (the wake/rest FSM pauses it while Resting/Dreaming).

use dte_events::{EventBus, EventPayload};
use dte_types::ClockState;

/// One boundary crossing recorded on a given `Advance()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    /// `step mod 2 == 0`
    Dyadic,
    /// `step mod 3 == 0`
    Triadic,
    /// `step mod 6 == 0` (`StageComplete`)
    Stage,
    /// `step == 30` wrapping back to 1
    Cycle,
    /// The delay-fold descriptor changed value
    Fold,
}

/// The expected number of sync events in one full 30-step cycle:
/// 15 dyadic + 10 triadic + 5 stage + 1 cycle + 11 fold = 42.
pub const EXPECTED_SYNCS_PER_CYCLE: u32 = 42;

/// The result of one `Advance()`.
#[derive(Debug, Clone)]
pub struct AdvanceResult {
    pub state: ClockState,
    pub syncs: Vec<SyncKind>,
}

fn derive(step: u8) -> ClockState {
    let dyadic = if step % 2 == 0 { 2 } else { 1 };
    let triadic = match step % 3 {
        0 => 3,
        r => r,
    };
    let stage = ((step - 1) / 6) + 1;
    let fold_phase = fold_phase_for(step);
    ClockState {
        step,
        dyadic,
        triadic,
        stage,
        fold_phase,
    }
}

/// The delay-fold pattern compresses the 2x3 multiplex into 4 segments
/// per 12-step sub-cycle, with durations `[1, 4, 6, 1]` (the `(1,A,1,-,-)`,
/// `(4,A,2,hold-dyad,-)`, `(6,B,2,-,hold-triad)`, `(1,B,3,-,-)` entries of
/// §4.1). `sub_step` is the 1-indexed position within the current
/// 12-step sub-cycle.
fn fold_phase_for(step: u8) -> u8 {
    let sub_step = ((step - 1) % 12) + 1;
    match sub_step {
        1 => 1,
        2..=5 => 2,
        6..=11 => 3,
        12 => 4,
        _ => unreachable!("sub_step is in 1..=12"),
    }
}

/// The 30-step cognitive cycle clock.
pub struct Clock {
    state: ClockState,
    paused: bool,
    total_syncs: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            state: ClockState::initial(),
            paused: false,
            total_syncs: 0,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Per the edge policy: Resting halts advancement; resuming continues
    /// from the preserved step, no catch-up.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Total sync events observed since construction (or since restore).
    /// Used by tests alongside `EXPECTED_SYNCS_PER_CYCLE`.
    pub fn total_syncs(&self) -> u64 {
        self.total_syncs
    }

    pub const fn expected_syncs_per_cycle() -> u32 {
        EXPECTED_SYNCS_PER_CYCLE
    }

    /// Restores the clock to a previously saved state (persistence
    /// replay). Resumes un-paused, lifecycle starting in Awake per §4.9.
    pub fn restore(state: ClockState) -> Self {
        Self {
            state,
            paused: false,
            total_syncs: 0,
        }
    }

    /// Advances one step, modulo 30, recomputing all derived phases and
    /// collecting boundary sync events. No-op (returns the unchanged
    /// state, no syncs) if the clock is currently paused.
    pub fn advance(&mut self) -> AdvanceResult {
        if self.paused {
            return AdvanceResult {
                state: self.state,
                syncs: Vec::new(),
            };
        }

        let previous_fold = self.state.fold_phase;
        let next_step = if self.state.step >= 30 { 1 } else { self.state.step + 1 };
        let next_state = derive(next_step);

        let mut syncs = Vec::new();
        if next_step % 2 == 0 {
            syncs.push(SyncKind::Dyadic);
        }
        if next_step % 3 == 0 {
            syncs.push(SyncKind::Triadic);
        }
        if next_step % 6 == 0 {
            syncs.push(SyncKind::Stage);
        }
        if next_step == 30 {
            syncs.push(SyncKind::Cycle);
        }
        if next_state.fold_phase != previous_fold {
            syncs.push(SyncKind::Fold);
        }

        self.state = next_state;
        self.total_syncs += syncs.len() as u64;

        AdvanceResult {
            state: next_state,
            syncs,
        }
    }

    /// Advances and publishes the resulting `PhaseTick` on the bus. This
    /// is the only event the clock itself puts on the bus; sync events
    /// are exposed via the returned `AdvanceResult` for callers (tests,
    /// the orchestrator) that need the finer-grained boundary info.
    pub async fn advance_and_publish(&mut self, bus: &EventBus) -> AdvanceResult {
        let result = self.advance();
        bus.publish(EventPayload::PhaseTick(result.state)).await;
        result
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
