//! The dream consolidator's algorithm (§4.6): recent thoughts into
//! clustered themes, themes into patterns, patterns into a one-sentence
//! generalization stored as a declarative memory node.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dte_config::{ConsolidatorConfig, ProviderConfig};
use dte_events::{EventBus, EventPayload};
use dte_lifecycle::{DreamOutcome, DreamRunner};
use dte_llm::{generate_with_retry, GenerateOpts, Provider};
use dte_memory::{MemoryNode, MemoryStore};
use dte_stream::ThoughtBuffer;
use dte_types::Pattern;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cluster::{cluster_by_tags, extract_themes, CandidateTheme};
use crate::sink::PatternSink;

pub struct Consolidator {
    cfg: ConsolidatorConfig,
    provider_cfg: ProviderConfig,
    provider: Arc<dyn Provider>,
    memory: Arc<dyn MemoryStore>,
    bus: EventBus,
    thoughts: ThoughtBuffer,
    sink: Arc<dyn PatternSink>,
    patterns: RwLock<HashMap<String, Pattern>>,
    consolidated: RwLock<std::collections::HashSet<u64>>,
}

impl Consolidator {
    pub fn new(
        cfg: ConsolidatorConfig,
        provider_cfg: ProviderConfig,
        provider: Arc<dyn Provider>,
        memory: Arc<dyn MemoryStore>,
        bus: EventBus,
        thoughts: ThoughtBuffer,
        sink: Arc<dyn PatternSink>,
    ) -> Self {
        Self {
            cfg,
            provider_cfg,
            provider,
            memory,
            bus,
            thoughts,
            sink,
            patterns: RwLock::new(HashMap::new()),
            consolidated: RwLock::new(std::collections::HashSet::new()),
        }
    }

    pub async fn patterns_snapshot(&self) -> Vec<Pattern> {
        self.patterns.read().await.values().cloned().collect()
    }

    /// One dream pass. A single sweep over the currently unconsolidated
    /// thoughts is its own fixed point (no new thoughts arrive mid-pass),
    /// so the wall-clock bound only guards against a runaway LLM call.
    pub async fn run_pass(&self) -> DreamOutcome {
        match tokio::time::timeout(self.cfg.wall_clock_bound, self.consolidate_once()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("dream consolidation hit its wall-clock bound");
                DreamOutcome::default()
            }
        }
    }

    async fn consolidate_once(&self) -> DreamOutcome {
        let cutoff = Utc::now() - chrono::Duration::from_std(self.cfg.episode_window).unwrap();
        let all_thoughts = self.thoughts.recent(usize::MAX).await;
        let unconsolidated: Vec<_> = {
            let consolidated = self.consolidated.read().await;
            all_thoughts
                .into_iter()
                .filter(|t| t.timestamp >= cutoff && !consolidated.contains(&t.id))
                .collect()
        };

        if unconsolidated.is_empty() {
            return DreamOutcome::default();
        }

        let clusters = cluster_by_tags(&unconsolidated);
        let mut qualifying: Vec<CandidateTheme> = Vec::new();
        for idxs in &clusters {
            let cluster_thoughts: Vec<&dte_types::Thought> = idxs.iter().map(|&i| &unconsolidated[i]).collect();
            for theme in extract_themes(&cluster_thoughts) {
                if theme.frequency >= self.cfg.min_theme_frequency
                    && theme.aggregate_importance >= self.cfg.min_theme_importance
                {
                    qualifying.push(theme);
                }
            }
        }
        qualifying.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then(b.aggregate_importance.partial_cmp(&a.aggregate_importance).unwrap())
        });

        let mut updated = Vec::new();
        for theme in &qualifying {
            let pattern = self.upsert_pattern(theme).await;
            updated.push(pattern);
        }

        for pattern in &mut updated {
            if let Some(generalization) = self.generalize(pattern).await {
                pattern.description = generalization.clone();
                self.memory
                    .store_node(MemoryNode {
                        node_type: "pattern".to_string(),
                        content: generalization,
                        importance: pattern.strength,
                        metadata: serde_json::json!({ "pattern_id": pattern.id, "tags": pattern.tags }),
                    })
                    .await
                    .ok();
                self.patterns.write().await.insert(pattern.tags.join(","), pattern.clone());
            }
        }

        let coherence = average_pairwise_tag_overlap(&updated);
        if coherence > self.cfg.coherence_emergence_threshold {
            self.bus
                .publish(EventPayload::EmergenceDetected {
                    coherence,
                    pattern_ids: updated.iter().map(|p| p.id).collect(),
                })
                .await;
        }

        self.sink.accept(updated.clone()).await;

        {
            let mut consolidated = self.consolidated.write().await;
            for t in &unconsolidated {
                consolidated.insert(t.id);
            }
        }
        self.thoughts.prune_older_than(cutoff).await;

        info!(patterns_updated = updated.len(), coherence, "dream pass complete");
        DreamOutcome {
            patterns_formed: updated.len(),
        }
    }

    async fn upsert_pattern(&self, theme: &CandidateTheme) -> Pattern {
        let mut patterns = self.patterns.write().await;
        match patterns.get_mut(&theme.token) {
            Some(existing) => {
                let strength = (theme.frequency as f32 / (theme.frequency as f32 + 1.0)).clamp(0.0, 1.0);
                for id in &theme.example_ids {
                    existing.record_occurrence(*id, strength);
                }
                existing.clone()
            }
            None => {
                let mut pattern = Pattern::new(theme.token.clone(), vec![theme.token.clone()], theme.example_ids[0]);
                for id in &theme.example_ids[1..] {
                    pattern.record_occurrence(*id, theme.aggregate_importance.clamp(0.0, 1.0));
                }
                patterns.insert(theme.token.clone(), pattern.clone());
                pattern
            }
        }
    }

    async fn generalize(&self, pattern: &Pattern) -> Option<String> {
        let prompt = format!(
            "In one sentence, generalize the recurring theme '{}' (seen {} times).",
            pattern.description, pattern.frequency
        );
        let opts = GenerateOpts {
            temperature: 0.5,
            max_tokens: 64,
        };
        match generate_with_retry(self.provider.as_ref(), &prompt, opts, &self.provider_cfg).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!("pattern generalization failed: {err}");
                None
            }
        }
    }
}

fn average_pairwise_tag_overlap(patterns: &[Pattern]) -> f32 {
    if patterns.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0;
    for i in 0..patterns.len() {
        for j in (i + 1)..patterns.len() {
            let a: std::collections::HashSet<_> = patterns[i].tags.iter().collect();
            let b: std::collections::HashSet<_> = patterns[j].tags.iter().collect();
            let union = a.union(&b).count();
            let overlap = if union == 0 {
                0.0
            } else {
                a.intersection(&b).count() as f32 / union as f32
            };
            total += overlap;
            pairs += 1;
        }
    }
    total / pairs as f32
}

#[async_trait]
impl DreamRunner for Consolidator {
    async fn run(&self, _episodes_since_last_dream: u64) -> DreamOutcome {
        self.run_pass().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_llm::MockProvider;
    use dte_memory::InMemoryStore;
    use dte_types::{ClockState, ThoughtKind, ThoughtSource};
    use std::time::Duration;

    fn thought(id: u64, content: &str, tags: &[&str], importance: f32) -> dte_types::Thought {
        dte_types::Thought::new(
            id,
            content,
            ThoughtKind::Observation,
            importance,
            tags.iter().map(|t| t.to_string()),
            ThoughtSource::Internal,
            ClockState::initial(),
        )
    }

    fn make_consolidator() -> (Consolidator, ThoughtBuffer) {
        let buffer = ThoughtBuffer::new(100);
        let cfg = ConsolidatorConfig {
            min_theme_frequency: 2,
            min_theme_importance: 0.5,
            coherence_emergence_threshold: 0.7,
            wall_clock_bound: Duration::from_secs(5),
            episode_window: Duration::from_secs(24 * 3600),
        };
        let provider_cfg = ProviderConfig {
            deadline: Duration::from_secs(1),
            max_retries: 0,
            backoff_base: Duration::from_millis(1),
        };
        let consolidator = Consolidator::new(
            cfg,
            provider_cfg,
            MockProvider::new(),
            Arc::new(InMemoryStore::new()),
            EventBus::new(8),
            buffer.clone(),
            Arc::new(crate::sink::NullPatternSink),
        );
        (consolidator, buffer)
    }

    #[tokio::test]
    async fn recurring_theme_forms_a_pattern() {
        let (consolidator, buffer) = make_consolidator();
        buffer.push(thought(1, "scheduling is tricky", &["work"], 0.6)).await;
        buffer.push(thought(2, "scheduling needs care", &["work"], 0.6)).await;
        buffer.push(thought(3, "scheduling again today", &["work"], 0.6)).await;

        let outcome = consolidator.run_pass().await;
        assert!(outcome.patterns_formed > 0);
        let patterns = consolidator.patterns_snapshot().await;
        assert!(patterns.iter().any(|p| p.frequency >= 2));
    }

    #[tokio::test]
    async fn sparse_thoughts_form_no_pattern() {
        let (consolidator, buffer) = make_consolidator();
        buffer.push(thought(1, "a rare one-off musing", &["misc"], 0.9)).await;

        let outcome = consolidator.run_pass().await;
        assert_eq!(outcome.patterns_formed, 0);
    }

    #[tokio::test]
    async fn second_pass_does_not_recount_consolidated_thoughts() {
        let (consolidator, buffer) = make_consolidator();
        buffer.push(thought(1, "scheduling is tricky", &["work"], 0.6)).await;
        buffer.push(thought(2, "scheduling needs care", &["work"], 0.6)).await;

        consolidator.run_pass().await;
        let outcome = consolidator.run_pass().await;
        assert_eq!(outcome.patterns_formed, 0);
    }
}
