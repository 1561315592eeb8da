//! The wisdom synthesizer: accumulation, synthesis, evolution, and
//! application cycle (§4.8).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dte_config::{ProviderConfig, WisdomConfig};
use dte_consolidator::PatternSink;
use dte_events::{EventBus, EventPayload};
use dte_llm::{generate_with_retry, GenerateOpts, Provider};
use dte_types::{Pattern, WisdomApplication, WisdomDomain, WisdomPrinciple};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::graph::WisdomGraph;
use crate::parser::parse_wisdom_reply;

#[derive(Debug, Clone)]
struct PendingPattern {
    description: String,
    source: String,
    strength: f32,
    tags: Vec<String>,
}

pub struct WisdomSynthesizer {
    cfg: WisdomConfig,
    provider_cfg: ProviderConfig,
    provider: Arc<dyn Provider>,
    bus: EventBus,
    pending: RwLock<Vec<PendingPattern>>,
    principles: RwLock<HashMap<Uuid, WisdomPrinciple>>,
    graph: RwLock<WisdomGraph>,
    wisdom_level: RwLock<f32>,
}

impl WisdomSynthesizer {
    pub fn new(cfg: WisdomConfig, provider_cfg: ProviderConfig, provider: Arc<dyn Provider>, bus: EventBus) -> Self {
        Self {
            cfg,
            provider_cfg,
            provider,
            bus,
            pending: RwLock::new(Vec::new()),
            principles: RwLock::new(HashMap::new()),
            graph: RwLock::new(WisdomGraph::new()),
            wisdom_level: RwLock::new(0.0),
        }
    }

    pub async fn wisdom_level(&self) -> f32 {
        *self.wisdom_level.read().await
    }

    pub async fn principles_snapshot(&self) -> Vec<WisdomPrinciple> {
        self.principles.read().await.values().cloned().collect()
    }

    /// Installs principles (and the wisdom level that came with them)
    /// recovered from a checkpoint, rebuilding the relation graph over
    /// them.
    pub async fn restore(&self, principles: Vec<WisdomPrinciple>, wisdom_level: f32) {
        let mut installed = self.principles.write().await;
        let mut graph = self.graph.write().await;
        for principle in principles {
            let existing: Vec<WisdomPrinciple> = installed.values().cloned().collect();
            graph.link_new_principle(&principle, &existing, self.cfg.relation_strength_threshold);
            installed.insert(principle.id, principle);
        }
        drop(installed);
        drop(graph);
        *self.wisdom_level.write().await = wisdom_level.clamp(0.0, 1.0);
    }

    /// `AccumulatePattern`: any module may call this. Synthesis triggers
    /// immediately once the pending count reaches the threshold.
    pub async fn accumulate_pattern(&self, description: impl Into<String>, source: impl Into<String>, strength: f32, tags: Vec<String>) {
        let mut pending = self.pending.write().await;
        pending.push(PendingPattern {
            description: description.into(),
            source: source.into(),
            strength,
            tags,
        });
        let ready = pending.len() >= self.cfg.pattern_threshold;
        drop(pending);
        if ready {
            self.synthesize().await;
        }
    }

    /// Invoked by the periodic synthesis ticker: synthesizes if at least
    /// `synthesis_tick_min_patterns` are pending, regardless of whether
    /// the full threshold has been reached.
    pub async fn on_synthesis_tick(&self) {
        let pending_len = self.pending.read().await.len();
        if pending_len >= self.cfg.synthesis_tick_min_patterns {
            self.synthesize().await;
        }
    }

    async fn synthesize(&self) {
        let batch = {
            let mut pending = self.pending.write().await;
            std::mem::take(&mut *pending)
        };
        if batch.is_empty() {
            return;
        }

        let descriptions = batch.iter().map(|p| p.description.as_str()).collect::<Vec<_>>().join("; ");
        let prompt = format!(
            "Distill these recurring patterns into one piece of wisdom.\n\
             Patterns: {descriptions}\n\
             Reply in exactly this structured format:\n\
             WISDOM: <one sentence>\nDOMAIN: <one of self_knowledge, learning, relationships, \
             decision_making, creativity, resilience, purpose, integration>\nDEPTH: <0.0-1.0>"
        );
        let opts = GenerateOpts {
            temperature: 0.6,
            max_tokens: 128,
        };

        let reply = match generate_with_retry(self.provider.as_ref(), &prompt, opts, &self.provider_cfg).await {
            Ok(text) => text,
            Err(err) => {
                warn!("wisdom synthesis failed: {err}");
                return;
            }
        };

        let parsed = parse_wisdom_reply(&reply);
        let confidence = (batch.iter().map(|p| p.strength).sum::<f32>() / batch.len() as f32).clamp(0.0, 1.0);
        let source_patterns: Vec<Uuid> = batch
            .iter()
            .filter_map(|p| Uuid::parse_str(&p.source).ok())
            .collect();
        let principle = WisdomPrinciple::new(parsed.content, parsed.domain, parsed.depth, confidence, source_patterns);

        {
            let mut principles = self.principles.write().await;
            let mut graph = self.graph.write().await;
            let existing: Vec<WisdomPrinciple> = principles.values().cloned().collect();
            graph.link_new_principle(&principle, &existing, self.cfg.relation_strength_threshold);
            principles.insert(principle.id, principle.clone());
        }

        let mut level = self.wisdom_level.write().await;
        *level = (*level + 0.01).clamp(0.0, 1.0);
        let new_level = *level;
        drop(level);

        self.bus
            .publish(EventPayload::WisdomGained {
                principle_id: principle.id,
                wisdom_level: new_level,
            })
            .await;
        info!(principle_id = %principle.id, domain = ?principle.domain, "wisdom principle synthesized");
    }

    /// Every 15 minutes: refine principles that have enough applications
    /// and middling effectiveness, installing the evolved successor
    /// alongside (never replacing) the original.
    pub async fn on_evolution_tick(&self) {
        let candidates: Vec<WisdomPrinciple> = {
            let principles = self.principles.read().await;
            principles
                .values()
                .filter(|p| {
                    p.apply_count >= self.cfg.evolution_min_apply_count
                        && p.average_effectiveness()
                            .map(|avg| avg > self.cfg.evolution_effectiveness_low && avg < self.cfg.evolution_effectiveness_high)
                            .unwrap_or(false)
                })
                .cloned()
                .collect()
        };

        for principle in candidates {
            let prompt = format!("Refine this principle into a sharper version: {}", principle.content);
            let opts = GenerateOpts {
                temperature: 0.5,
                max_tokens: 96,
            };
            match generate_with_retry(self.provider.as_ref(), &prompt, opts, &self.provider_cfg).await {
                Ok(refined) => {
                    let evolved = principle.evolve(refined);
                    let mut principles = self.principles.write().await;
                    let mut graph = self.graph.write().await;
                    let existing: Vec<WisdomPrinciple> = principles.values().cloned().collect();
                    graph.link_new_principle(&evolved, &existing, self.cfg.relation_strength_threshold);
                    principles.insert(evolved.id, evolved);
                }
                Err(err) => warn!("principle evolution failed: {err}"),
            }
        }
    }

    /// Every 2 minutes while Awake: apply the principle maximizing
    /// `depth * confidence * domain_match(context) * recency_boost`.
    pub async fn on_application_tick(&self, current_context: &str) {
        let mut principles = self.principles.write().await;
        let Some(chosen_id) = principles
            .values()
            .max_by(|a, b| {
                application_score(a, current_context)
                    .partial_cmp(&application_score(b, current_context))
                    .unwrap()
            })
            .map(|p| p.id)
        else {
            return;
        };

        if let Some(principle) = principles.get_mut(&chosen_id) {
            principle.record_application(WisdomApplication::new(current_context, "Applied to current state", 0.7));
        }
    }
}

fn domain_match(domain: WisdomDomain, current_context: &str) -> f32 {
    let name = match domain {
        WisdomDomain::SelfKnowledge => "self_knowledge",
        WisdomDomain::Learning => "learning",
        WisdomDomain::Relationships => "relationships",
        WisdomDomain::DecisionMaking => "decision_making",
        WisdomDomain::Creativity => "creativity",
        WisdomDomain::Resilience => "resilience",
        WisdomDomain::Purpose => "purpose",
        WisdomDomain::Integration => "integration",
    };
    if current_context.to_lowercase().contains(name) {
        1.0
    } else {
        0.3
    }
}

fn recency_boost(principle: &WisdomPrinciple) -> f32 {
    let last_touch = principle
        .applications
        .last()
        .map(|a| a.timestamp)
        .unwrap_or(principle.created_at);
    let days = (Utc::now() - last_touch).num_seconds() as f32 / 86_400.0;
    (1.0 / (1.0 + days.max(0.0))).clamp(0.0, 1.0)
}

fn application_score(principle: &WisdomPrinciple, current_context: &str) -> f32 {
    principle.depth * principle.confidence * domain_match(principle.domain, current_context) * recency_boost(principle)
}

#[async_trait]
impl PatternSink for WisdomSynthesizer {
    async fn accept(&self, patterns: Vec<Pattern>) {
        for pattern in patterns {
            self.accumulate_pattern(pattern.description.clone(), pattern.id.to_string(), pattern.strength, pattern.tags.clone())
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_llm::MockProvider;
    use std::time::Duration;

    fn synth() -> WisdomSynthesizer {
        let cfg = WisdomConfig {
            pattern_threshold: 2,
            synthesis_tick: Duration::from_secs(300),
            synthesis_tick_min_patterns: 1,
            evolution_tick: Duration::from_secs(900),
            evolution_min_apply_count: 1,
            evolution_effectiveness_low: 0.4,
            evolution_effectiveness_high: 0.8,
            application_tick: Duration::from_secs(120),
            relation_strength_threshold: 0.3,
        };
        let provider_cfg = ProviderConfig {
            deadline: Duration::from_secs(1),
            max_retries: 0,
            backoff_base: Duration::from_millis(1),
        };
        WisdomSynthesizer::new(cfg, provider_cfg, MockProvider::new(), EventBus::new(8))
    }

    #[tokio::test]
    async fn reaching_threshold_triggers_synthesis() {
        let synth = synth();
        synth.accumulate_pattern("a recurring theme", "src-1", 0.6, vec!["x".into()]).await;
        synth.accumulate_pattern("another one", "src-2", 0.7, vec!["x".into()]).await;
        assert_eq!(synth.principles_snapshot().await.len(), 1);
        assert!(synth.wisdom_level().await > 0.0);
    }

    #[tokio::test]
    async fn restore_installs_principles_and_wisdom_level() {
        let synth = synth();
        let principle = dte_types::WisdomPrinciple::new("seed", dte_types::WisdomDomain::Learning, 0.5, 0.5, vec![]);
        synth.restore(vec![principle], 0.42).await;
        assert_eq!(synth.principles_snapshot().await.len(), 1);
        assert_eq!(synth.wisdom_level().await, 0.42);
    }

    #[tokio::test]
    async fn application_records_against_the_best_matching_principle() {
        let synth = synth();
        synth.accumulate_pattern("a", "src-1", 0.6, vec![]).await;
        synth.accumulate_pattern("b", "src-2", 0.6, vec![]).await;
        synth.on_application_tick("integration focused context").await;
        let principles = synth.principles_snapshot().await;
        assert!(principles.iter().any(|p| p.apply_count == 1));
    }
}
