//! Autonomous thought stream (§4.3): generates a phase-appropriate
//! thought on a cadence independent of external input.

pub mod buffer;
pub mod context;
pub mod gaps;
pub mod prompt;
pub mod selection;
pub mod stream;

pub use buffer::ThoughtBuffer;
pub use context::{ContextSource, StaticContext};
pub use gaps::{KnowledgeGap, KnowledgeGapTracker};
pub use prompt::{build_prompt, fallback_content, PromptContext, FALLBACK_IMPORTANCE};
pub use selection::{select_kind, Register};
pub use stream::ThoughtStream;
