//! Read-only views exposed by the orchestrator's control surface.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dte_engines::EnginePoolMetrics;
use dte_types::{LifecycleState, VitalSigns, WisdomDomain};

/// `Status()`: the orchestrator's headline snapshot.
#[derive(Debug, Clone)]
pub struct Status {
    pub state: LifecycleState,
    pub uptime: Duration,
    pub cycles: u64,
    pub thoughts: u64,
    pub wisdom_level: f32,
    pub awareness: f32,
    pub load: f32,
    pub fatigue: f32,
    pub principles: usize,
    pub active_conversations: usize,
}

/// `GetSelfModel()`: identity plus the top wisdom domains by centrality,
/// not otherwise defined upstream so this is the canonical shape.
#[derive(Debug, Clone)]
pub struct SelfModel {
    pub identity_signature: String,
    pub birth_time: DateTime<Utc>,
    pub core_values: Vec<String>,
    pub wisdom_level: f32,
    pub top_domains: Vec<(WisdomDomain, f32)>,
    pub vitals: VitalSigns,
}

/// `awareness`: a composite of focus clarity and emotional balance, the
/// two vital-sign components not already surfaced individually in
/// `Status` (`load` is cognitive load, `fatigue` is fatigue).
pub fn awareness(vitals: &VitalSigns) -> f32 {
    ((vitals.focus_clarity + vitals.emotional_balance) / 2.0).clamp(0.0, 1.0)
}

/// `GetMetrics()`: the observability surface every module's internal
/// counters feed.
#[derive(Debug, Clone)]
pub struct CoreMetrics {
    pub engines: EnginePoolMetrics,
    pub bus_subscriber_count: usize,
    pub interest_topic_count: usize,
    pub active_discussions: usize,
    pub pattern_count: usize,
}
