//! Shared data model for the Deep Tree Echo cognitive core.
//!
//! Every entity here is a plain, `serde`-derived value type with no
//! behavior beyond small invariant-preserving constructors and helpers.
//! Behavior lives in the crates that own each entity (clock, engines,
//! consolidator, wisdom synthesizer, persistence).

pub mod checkpoint;
pub mod clock_state;
pub mod episode;
pub mod goal;
pub mod interest;
pub mod lifecycle;
pub mod pattern;
pub mod thought;
pub mod util;
pub mod vitals;
pub mod wisdom;

pub use checkpoint::{Checkpoint, Counters, Identity, CHECKPOINT_VERSION};
pub use clock_state::ClockState;
pub use episode::Episode;
pub use goal::Goal;
pub use interest::InterestScore;
pub use lifecycle::LifecycleState;
pub use pattern::Pattern;
pub use thought::{Thought, ThoughtKind, ThoughtSource};
pub use vitals::VitalSigns;
pub use wisdom::{WisdomApplication, WisdomDomain, WisdomPrinciple};
