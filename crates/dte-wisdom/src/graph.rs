//! The wisdom graph: principles linked by relation strength, with a
//! simple degree-based centrality measure (§4.8).

use std::collections::{HashMap, HashSet};

use dte_types::WisdomPrinciple;
use uuid::Uuid;

/// Domains treated as complementary (contribute to relation strength
/// even when not identical). Symmetric; order within a pair is
/// arbitrary.
const COMPLEMENTARY_PAIRS: &[(dte_types::WisdomDomain, dte_types::WisdomDomain)] = &[
    (dte_types::WisdomDomain::SelfKnowledge, dte_types::WisdomDomain::Purpose),
    (dte_types::WisdomDomain::Learning, dte_types::WisdomDomain::Creativity),
    (dte_types::WisdomDomain::DecisionMaking, dte_types::WisdomDomain::Resilience),
    (dte_types::WisdomDomain::Relationships, dte_types::WisdomDomain::SelfKnowledge),
];

fn is_complementary(a: dte_types::WisdomDomain, b: dte_types::WisdomDomain) -> bool {
    COMPLEMENTARY_PAIRS.iter().any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

/// Relation strength between two principles: same domain scores
/// highest, complementary domains moderate, a shared source pattern
/// adds on top. The maximum contributing factor wins rather than
/// summing unboundedly.
pub fn relation_strength(a: &WisdomPrinciple, b: &WisdomPrinciple) -> f32 {
    let mut strength: f32 = 0.0;
    if a.domain == b.domain {
        strength = strength.max(0.6);
    } else if is_complementary(a.domain, b.domain) {
        strength = strength.max(0.4);
    }
    let shared_source = a.source_patterns.iter().any(|p| b.source_patterns.contains(p));
    if shared_source {
        strength = strength.max(0.5);
    }
    strength
}

#[derive(Default)]
pub struct WisdomGraph {
    edges: HashMap<Uuid, HashSet<Uuid>>,
}

impl WisdomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `new_principle` to every existing principle whose relation
    /// strength exceeds `threshold`.
    pub fn link_new_principle(
        &mut self,
        new_principle: &WisdomPrinciple,
        existing: &[WisdomPrinciple],
        threshold: f32,
    ) {
        self.edges.entry(new_principle.id).or_default();
        for other in existing {
            if other.id == new_principle.id {
                continue;
            }
            if relation_strength(new_principle, other) > threshold {
                self.edges.entry(new_principle.id).or_default().insert(other.id);
                self.edges.entry(other.id).or_default().insert(new_principle.id);
            }
        }
    }

    pub fn degree(&self, id: Uuid) -> usize {
        self.edges.get(&id).map(|s| s.len()).unwrap_or(0)
    }

    fn total_connections(&self) -> usize {
        self.edges.values().map(|s| s.len()).sum()
    }

    /// `connections / total_connections`; 0 when the graph has no edges
    /// yet.
    pub fn centrality(&self, id: Uuid) -> f32 {
        let total = self.total_connections();
        if total == 0 {
            return 0.0;
        }
        self.degree(id) as f32 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_types::WisdomDomain;

    fn principle(domain: WisdomDomain, source: Vec<Uuid>) -> WisdomPrinciple {
        WisdomPrinciple::new("p", domain, 0.5, 0.5, source)
    }

    #[test]
    fn same_domain_links_above_threshold() {
        let mut graph = WisdomGraph::new();
        let a = principle(WisdomDomain::Learning, vec![]);
        let b = principle(WisdomDomain::Learning, vec![]);
        graph.link_new_principle(&a, &[b.clone()], 0.3);
        assert_eq!(graph.degree(a.id), 1);
        assert_eq!(graph.degree(b.id), 1);
    }

    #[test]
    fn unrelated_domains_do_not_link() {
        let mut graph = WisdomGraph::new();
        let a = principle(WisdomDomain::Learning, vec![]);
        let b = principle(WisdomDomain::Purpose, vec![]);
        graph.link_new_principle(&a, &[b.clone()], 0.3);
        assert_eq!(graph.degree(a.id), 0);
    }

    #[test]
    fn centrality_is_zero_with_no_edges() {
        let graph = WisdomGraph::new();
        assert_eq!(graph.centrality(Uuid::new_v4()), 0.0);
    }
}
