//! The event taxonomy and envelope carried across the bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dte_types::{ClockState, Goal, LifecycleState, Thought};

/// Minimal taxonomy of event types (§4.4). `EventType` is what subscribers
/// register interest in; `EventPayload` carries the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    PhaseTick,
    ThoughtGenerated,
    KnowledgeGapIdentified,
    InterestEmerged,
    GoalCreated,
    GoalAchieved,
    EmergenceDetected,
    StateTransition,
    DreamStarted,
    DreamEnded,
    WisdomGained,
    ConversationDetected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    PhaseTick(ClockState),
    ThoughtGenerated(Thought),
    KnowledgeGapIdentified { topic: String, importance: f32 },
    InterestEmerged { topic: String, score: f32 },
    GoalCreated(Goal),
    GoalAchieved(Goal),
    EmergenceDetected { coherence: f32, pattern_ids: Vec<Uuid> },
    StateTransition { from: LifecycleState, to: LifecycleState },
    DreamStarted,
    DreamEnded { patterns_formed: usize },
    WisdomGained { principle_id: Uuid, wisdom_level: f32 },
    ConversationDetected { conversation_id: String, opener: String },
}

impl EventPayload {
    pub fn kind(&self) -> EventType {
        match self {
            EventPayload::PhaseTick(_) => EventType::PhaseTick,
            EventPayload::ThoughtGenerated(_) => EventType::ThoughtGenerated,
            EventPayload::KnowledgeGapIdentified { .. } => EventType::KnowledgeGapIdentified,
            EventPayload::InterestEmerged { .. } => EventType::InterestEmerged,
            EventPayload::GoalCreated(_) => EventType::GoalCreated,
            EventPayload::GoalAchieved(_) => EventType::GoalAchieved,
            EventPayload::EmergenceDetected { .. } => EventType::EmergenceDetected,
            EventPayload::StateTransition { .. } => EventType::StateTransition,
            EventPayload::DreamStarted => EventType::DreamStarted,
            EventPayload::DreamEnded { .. } => EventType::DreamEnded,
            EventPayload::WisdomGained { .. } => EventType::WisdomGained,
            EventPayload::ConversationDetected { .. } => EventType::ConversationDetected,
        }
    }
}

/// An event as delivered to a subscriber: the payload plus bus metadata.
/// `seq` is monotonic and global to the bus instance, used by tests to
/// assert per-subscriber FIFO ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub payload: EventPayload,
    pub emitted_at: DateTime<Utc>,
}

impl Event {
    pub fn kind(&self) -> EventType {
        self.payload.kind()
    }
}
