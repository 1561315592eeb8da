//! `Goal`: an entry in the orchestrator's goal queue.
//!
//! Not separately specified in §3, but referenced by `GoalCreated` /
//! `GoalAchieved` events (§4.4) and the `Checkpoint.goal_queue` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub achieved: bool,
    pub achieved_at: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            created_at: Utc::now(),
            achieved: false,
            achieved_at: None,
        }
    }

    pub fn mark_achieved(&mut self) {
        self.achieved = true;
        self.achieved_at = Some(Utc::now());
    }
}
