//! Interest scoring and the discussion engagement gate (§4.7).

pub mod discussion;
pub mod gate;
pub mod scoring;

pub use discussion::{maybe_initiate, Discussion, DiscussionTracker};
pub use gate::{consider_skill, EngagementDecision, FatigueSource};
pub use scoring::InterestMap;
