//! `WisdomPrinciple`: a synthesized, evolvable rule distilled from patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clamp01;

/// Canonical domain enumeration (§3). Fixed regardless of naming drift
/// elsewhere in the literature this system draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WisdomDomain {
    SelfKnowledge,
    Learning,
    Relationships,
    DecisionMaking,
    Creativity,
    Resilience,
    Purpose,
    Integration,
}

impl WisdomDomain {
    /// Falls back to `Integration` when a structured reply can't be parsed,
    /// per the wisdom synthesizer's parsing contract.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "self_knowledge" | "selfknowledge" | "self-knowledge" => WisdomDomain::SelfKnowledge,
            "learning" => WisdomDomain::Learning,
            "relationships" => WisdomDomain::Relationships,
            "decision_making" | "decisionmaking" | "decision-making" => WisdomDomain::DecisionMaking,
            "creativity" => WisdomDomain::Creativity,
            "resilience" => WisdomDomain::Resilience,
            "purpose" => WisdomDomain::Purpose,
            _ => WisdomDomain::Integration,
        }
    }
}

/// A single recorded application of a principle, part of the append-only
/// applications log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WisdomApplication {
    pub context: String,
    pub note: String,
    pub effectiveness: f32,
    pub timestamp: DateTime<Utc>,
}

impl WisdomApplication {
    pub fn new(context: impl Into<String>, note: impl Into<String>, effectiveness: f32) -> Self {
        Self {
            context: context.into(),
            note: note.into(),
            effectiveness: clamp01(effectiveness),
            timestamp: Utc::now(),
        }
    }
}

/// A synthesized rule distilled from three or more patterns.
///
/// Invariants: principles may *evolve* into a new record referencing
/// `parent_id`; the original record is retained (never mutated in place
/// by evolution - callers install the new record alongside the old one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WisdomPrinciple {
    pub id: Uuid,
    pub content: String,
    pub domain: WisdomDomain,
    pub depth: f32,
    pub confidence: f32,
    pub source_patterns: Vec<Uuid>,
    pub applications: Vec<WisdomApplication>,
    pub apply_count: u32,
    pub evolution_count: u32,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl WisdomPrinciple {
    pub fn new(
        content: impl Into<String>,
        domain: WisdomDomain,
        depth: f32,
        confidence: f32,
        source_patterns: Vec<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            domain,
            depth: clamp01(depth),
            confidence: clamp01(confidence),
            source_patterns,
            applications: Vec::new(),
            apply_count: 0,
            evolution_count: 0,
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    /// Average effectiveness across all recorded applications, used by
    /// the evolution selection criterion (`apply_count >= 3` and average
    /// effectiveness in `(0.4, 0.8)`).
    pub fn average_effectiveness(&self) -> Option<f32> {
        if self.applications.is_empty() {
            return None;
        }
        let sum: f32 = self.applications.iter().map(|a| a.effectiveness).sum();
        Some(sum / self.applications.len() as f32)
    }

    pub fn record_application(&mut self, application: WisdomApplication) {
        self.applications.push(application);
        self.apply_count += 1;
    }

    /// Produces the evolved successor record: a fresh principle linked to
    /// `self` via `parent_id`, with depth/confidence nudged up per §4.8.
    pub fn evolve(&self, refined_content: impl Into<String>) -> WisdomPrinciple {
        WisdomPrinciple {
            id: Uuid::new_v4(),
            content: refined_content.into(),
            domain: self.domain,
            depth: clamp01(self.depth + 0.1),
            confidence: clamp01(self.confidence + 0.05),
            source_patterns: self.source_patterns.clone(),
            applications: Vec::new(),
            apply_count: 0,
            evolution_count: self.evolution_count + 1,
            parent_id: Some(self.id),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parse_falls_back_to_integration() {
        assert_eq!(WisdomDomain::parse_or_default("garbage"), WisdomDomain::Integration);
        assert_eq!(WisdomDomain::parse_or_default("learning"), WisdomDomain::Learning);
    }

    #[test]
    fn evolve_links_parent_and_bumps_scores() {
        let p = WisdomPrinciple::new("seed", WisdomDomain::Purpose, 0.5, 0.5, vec![]);
        let evolved = p.evolve("refined");
        assert_eq!(evolved.parent_id, Some(p.id));
        assert_eq!(evolved.evolution_count, 1);
        assert!((evolved.depth - 0.6).abs() < 1e-6);
        assert!((evolved.confidence - 0.55).abs() < 1e-6);
    }

    #[test]
    fn average_effectiveness_none_when_empty() {
        let p = WisdomPrinciple::new("x", WisdomDomain::Integration, 0.1, 0.1, vec![]);
        assert_eq!(p.average_effectiveness(), None);
    }
}
