//! Bounded per-engine task-history ring buffer.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub step: u32,
    pub description: String,
    pub completed_at: DateTime<Utc>,
    pub succeeded: bool,
}

/// Fixed-capacity FIFO of the most recent task outcomes, used to derive
/// the engine's EMA performance score.
#[derive(Debug, Clone)]
pub struct TaskHistory {
    cap: usize,
    entries: VecDeque<TaskRecord>,
}

impl TaskHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, record: TaskRecord) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&TaskRecord> {
        self.entries.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: u32, succeeded: bool) -> TaskRecord {
        TaskRecord {
            step,
            description: format!("step {step}"),
            completed_at: Utc::now(),
            succeeded,
        }
    }

    #[test]
    fn evicts_oldest_once_full() {
        let mut history = TaskHistory::new(2);
        history.push(record(1, true));
        history.push(record(2, true));
        history.push(record(3, false));

        assert_eq!(history.len(), 2);
        let steps: Vec<u32> = history.iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![2, 3]);
    }

    #[test]
    fn latest_reflects_most_recent_push() {
        let mut history = TaskHistory::new(64);
        assert!(history.latest().is_none());
        history.push(record(1, true));
        history.push(record(2, false));
        assert_eq!(history.latest().unwrap().step, 2);
        assert!(!history.latest().unwrap().succeeded);
    }
}
