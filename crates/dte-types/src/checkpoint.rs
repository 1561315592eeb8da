//! `Checkpoint`: the serializable union of accumulated cognitive state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clock_state::ClockState;
use crate::goal::Goal;
use crate::interest::InterestScore;
use crate::thought::Thought;
use crate::vitals::VitalSigns;
use crate::wisdom::WisdomPrinciple;

/// Monotonic counters accumulated across the process lifetime, carried
/// across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub cycles: u64,
    pub thoughts_generated: u64,
    pub patterns_formed: u64,
    pub principles_synthesized: u64,
    pub dreams_completed: u64,
    pub session_n: u64,
}

/// Stable identity carried across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Hex-encoded SHA-256 of `(core_values || wisdom_domains || birth_time)`.
    pub signature: String,
    pub birth_time: chrono::DateTime<chrono::Utc>,
    pub core_values: Vec<String>,
}

/// The serializable union of: identity signature, accumulated counters,
/// last N thoughts, current vital signs, active principles, interest map,
/// goal queue, clock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub identity: Identity,
    pub counters: Counters,
    pub thoughts: Vec<Thought>,
    pub interests: HashMap<String, InterestScore>,
    pub goals: Vec<Goal>,
    pub principles: Vec<WisdomPrinciple>,
    pub vital_signs: VitalSigns,
    pub clock: ClockState,
    pub wisdom_level: f32,
}

/// Current on-disk schema version. Bump when the layout changes in a way
/// that is not backward compatible.
pub const CHECKPOINT_VERSION: u32 = 1;
