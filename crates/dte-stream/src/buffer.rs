//! Bounded shared buffer of recently generated thoughts (default cap 100).

use std::collections::VecDeque;
use std::sync::Arc;

use dte_types::Thought;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct ThoughtBuffer {
    cap: usize,
    entries: Arc<RwLock<VecDeque<Thought>>>,
}

impl ThoughtBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(cap))),
        }
    }

    pub async fn push(&self, thought: Thought) {
        let mut guard = self.entries.write().await;
        if guard.len() == self.cap {
            guard.pop_front();
        }
        guard.push_back(thought);
    }

    /// Most recent `limit` entries, newest last (chronological order),
    /// matching what a prompt builder reading "recent N entries" expects.
    pub async fn recent(&self, limit: usize) -> Vec<Thought> {
        let guard = self.entries.read().await;
        let len = guard.len();
        let skip = len.saturating_sub(limit);
        guard.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops entries older than `cutoff`, returning how many were removed.
    pub async fn prune_older_than(&self, cutoff: chrono::DateTime<chrono::Utc>) -> usize {
        let mut guard = self.entries.write().await;
        let before = guard.len();
        guard.retain(|t| t.timestamp >= cutoff);
        before - guard.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_types::{ClockState, ThoughtKind, ThoughtSource};

    fn thought(id: u64) -> Thought {
        Thought::new(id, format!("t{id}"), ThoughtKind::Observation, 0.5, [], ThoughtSource::Internal, ClockState::initial())
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let buffer = ThoughtBuffer::new(2);
        buffer.push(thought(1)).await;
        buffer.push(thought(2)).await;
        buffer.push(thought(3)).await;
        assert_eq!(buffer.len().await, 2);
        let recent = buffer.recent(10).await;
        assert_eq!(recent.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn recent_caps_at_requested_limit() {
        let buffer = ThoughtBuffer::new(10);
        for id in 1..=5 {
            buffer.push(thought(id)).await;
        }
        let recent = buffer.recent(3).await;
        assert_eq!(recent.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
