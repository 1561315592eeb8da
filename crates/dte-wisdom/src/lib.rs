//! Pattern-to-wisdom synthesis: structured reply parsing, the relation
//! graph between principles, and the accumulate/synthesize/evolve/apply
//! cycle (§4.8).

pub mod graph;
pub mod parser;
pub mod synthesizer;

pub use graph::{relation_strength, WisdomGraph};
pub use parser::{parse_wisdom_reply, ParsedWisdom};
pub use synthesizer::WisdomSynthesizer;
