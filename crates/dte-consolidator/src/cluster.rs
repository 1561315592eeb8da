//! Clustering recent thoughts by shared tags (a simple union-find over
//! tag co-occurrence) and extracting candidate themes per cluster.

use std::collections::HashMap;

use dte_types::Thought;

use crate::stopwords::tokenize;

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Groups thought indices into clusters of thoughts that share at least
/// one tag (transitively). Thoughts with no tags form singleton clusters.
pub fn cluster_by_tags(thoughts: &[Thought]) -> Vec<Vec<usize>> {
    let mut dsu = DisjointSet::new(thoughts.len());
    let mut by_tag: HashMap<&str, usize> = HashMap::new();

    for (idx, thought) in thoughts.iter().enumerate() {
        for tag in &thought.tags {
            match by_tag.get(tag.as_str()) {
                Some(&first) => dsu.union(first, idx),
                None => {
                    by_tag.insert(tag.as_str(), idx);
                }
            }
        }
    }

    let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
    for idx in 0..thoughts.len() {
        let root = dsu.find(idx);
        clusters.entry(root).or_default().push(idx);
    }
    clusters.into_values().collect()
}

/// One candidate theme within a cluster: the token, how many thoughts in
/// the cluster mention it, and the summed importance of those thoughts.
#[derive(Debug, Clone)]
pub struct CandidateTheme {
    pub token: String,
    pub frequency: u32,
    pub aggregate_importance: f32,
    pub example_ids: Vec<u64>,
}

pub fn extract_themes(cluster: &[&Thought]) -> Vec<CandidateTheme> {
    let mut counts: HashMap<String, CandidateTheme> = HashMap::new();
    for thought in cluster {
        let mut seen_in_thought = std::collections::HashSet::new();
        for token in tokenize(&thought.content) {
            if !seen_in_thought.insert(token.clone()) {
                continue;
            }
            let entry = counts.entry(token.clone()).or_insert_with(|| CandidateTheme {
                token,
                frequency: 0,
                aggregate_importance: 0.0,
                example_ids: Vec::new(),
            });
            entry.frequency += 1;
            entry.aggregate_importance += thought.importance;
            entry.example_ids.push(thought.id);
        }
    }
    let mut themes: Vec<_> = counts.into_values().collect();
    themes.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    themes
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_types::{ClockState, ThoughtKind, ThoughtSource};

    fn thought(id: u64, content: &str, tags: &[&str]) -> Thought {
        Thought::new(
            id,
            content,
            ThoughtKind::Observation,
            0.6,
            tags.iter().map(|t| t.to_string()),
            ThoughtSource::Internal,
            ClockState::initial(),
        )
    }

    #[test]
    fn thoughts_sharing_a_tag_land_in_one_cluster() {
        let thoughts = vec![
            thought(1, "a", &["rust"]),
            thought(2, "b", &["rust"]),
            thought(3, "c", &["cooking"]),
        ];
        let clusters = cluster_by_tags(&thoughts);
        assert_eq!(clusters.len(), 2);
        let sizes: Vec<usize> = {
            let mut s: Vec<usize> = clusters.iter().map(|c| c.len()).collect();
            s.sort_unstable();
            s
        };
        assert_eq!(sizes, vec![1, 2]);
    }

    #[test]
    fn theme_extraction_counts_distinct_thoughts_not_occurrences() {
        let thoughts = vec![
            thought(1, "scheduling is hard scheduling", &[]),
            thought(2, "scheduling takes care", &[]),
        ];
        let refs: Vec<&Thought> = thoughts.iter().collect();
        let themes = extract_themes(&refs);
        let scheduling = themes.iter().find(|t| t.token == "scheduling").unwrap();
        assert_eq!(scheduling.frequency, 2);
    }
}
