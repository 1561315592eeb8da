//! Persistent memory abstraction for Deep Tree Echo.
//!
//! Storage itself is out of scope (§1): this crate defines the narrow
//! `MemoryStore` trait the consolidator and wisdom synthesizer program
//! against, plus an in-process implementation suitable for tests and for
//! running the core without a real backing store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use dte_types::{Episode, Identity};

/// A declarative memory node (§4.6 step 4: "store as a new declarative
/// memory node").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNode {
    pub node_type: String,
    pub content: String,
    pub importance: f32,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type MemoryResult<T> = Result<T, MemoryError>;

/// `StoreNode`, `StoreEdge`, `StoreEpisode`, `StoreIdentitySnapshot`,
/// `LatestIdentitySnapshot` per §6.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn store_node(&self, node: MemoryNode) -> MemoryResult<Uuid>;
    async fn store_edge(&self, from: Uuid, to: Uuid, relation: &str) -> MemoryResult<()>;
    async fn store_episode(&self, episode: Episode) -> MemoryResult<()>;
    async fn store_identity_snapshot(&self, snapshot: Identity) -> MemoryResult<()>;
    async fn latest_identity_snapshot(&self) -> MemoryResult<Option<Identity>>;
}

#[derive(Debug, Clone)]
struct Edge {
    from: Uuid,
    to: Uuid,
    relation: String,
}

/// In-process store, following `beagle_checkpoint::memory::InMemoryCheckpointer`'s
/// `Arc<RwLock<HashMap<...>>>` shape. Data is lost on restart; suitable
/// for tests and for running without a real backing store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    nodes: Arc<RwLock<HashMap<Uuid, MemoryNode>>>,
    edges: Arc<RwLock<Vec<Edge>>>,
    episodes: Arc<RwLock<Vec<Episode>>>,
    identity: Arc<RwLock<Option<Identity>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn episode_count(&self) -> usize {
        self.episodes.read().await.len()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn store_node(&self, node: MemoryNode) -> MemoryResult<Uuid> {
        let id = Uuid::new_v4();
        self.nodes.write().await.insert(id, node);
        Ok(id)
    }

    async fn store_edge(&self, from: Uuid, to: Uuid, relation: &str) -> MemoryResult<()> {
        self.edges.write().await.push(Edge {
            from,
            to,
            relation: relation.to_string(),
        });
        Ok(())
    }

    async fn store_episode(&self, episode: Episode) -> MemoryResult<()> {
        self.episodes.write().await.push(episode);
        Ok(())
    }

    async fn store_identity_snapshot(&self, snapshot: Identity) -> MemoryResult<()> {
        *self.identity.write().await = Some(snapshot);
        Ok(())
    }

    async fn latest_identity_snapshot(&self) -> MemoryResult<Option<Identity>> {
        Ok(self.identity.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn stores_and_retrieves_identity_snapshot() {
        let store = InMemoryStore::new();
        assert!(store.latest_identity_snapshot().await.unwrap().is_none());

        let identity = Identity {
            signature: "abc".into(),
            birth_time: Utc::now(),
            core_values: vec!["curiosity".into()],
        };
        store.store_identity_snapshot(identity.clone()).await.unwrap();
        let latest = store.latest_identity_snapshot().await.unwrap().unwrap();
        assert_eq!(latest.signature, "abc");
    }

    #[tokio::test]
    async fn stores_nodes_and_episodes() {
        let store = InMemoryStore::new();
        let id = store
            .store_node(MemoryNode {
                node_type: "pattern".into(),
                content: "recurring resonance".into(),
                importance: 0.8,
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap();
        assert_eq!(store.node_count().await, 1);

        let episode = Episode::new(vec![1, 2], 0.9, "ctx");
        store.store_episode(episode).await.unwrap();
        assert_eq!(store.episode_count().await, 1);

        store.store_edge(id, id, "self-reference").await.unwrap();
    }
}
