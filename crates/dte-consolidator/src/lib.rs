//! Dream consolidator (§4.6): turns recent thoughts into patterns and a
//! one-sentence generalization per pattern, during `Dreaming`.

pub mod cluster;
pub mod consolidator;
pub mod sink;
pub mod stopwords;

pub use cluster::{cluster_by_tags, extract_themes, CandidateTheme};
pub use consolidator::Consolidator;
pub use sink::{NullPatternSink, PatternSink};
