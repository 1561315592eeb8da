//! Deterministic modular policy mapping the internal thought counter to
//! a thought kind, and the clock's triadic phase to an expressive
//! register used for prompt temperature.

use dte_types::{ClockState, ThoughtKind};

/// Checked in descending `n mod` order; the first qualifying rule wins,
/// which resolves ties to the highest-numbered rule as specified. `n == 0`
/// is vacuously divisible by every modulus, so it is special-cased to the
/// Observation default rather than falling into the first (Wisdom) arm.
pub fn select_kind(n: u64, knowledge_gaps_exist: bool) -> ThoughtKind {
    if n == 0 {
        return ThoughtKind::Observation;
    }
    if n % 11 == 0 {
        return ThoughtKind::Wisdom;
    }
    if n % 8 == 0 {
        return ThoughtKind::Planning;
    }
    if n % 7 == 0 {
        return ThoughtKind::Insight;
    }
    if n % 6 == 0 {
        return ThoughtKind::Connection;
    }
    if n % 5 == 0 && knowledge_gaps_exist {
        return ThoughtKind::Curiosity;
    }
    if n % 4 == 0 {
        return ThoughtKind::Reflection;
    }
    if n % 3 == 0 && knowledge_gaps_exist {
        return ThoughtKind::Question;
    }
    ThoughtKind::Observation
}

/// The three expressive registers the thought stream cycles through,
/// driven by the clock's triadic phase (`1..=3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Expressive,
    Reflective,
    Anticipatory,
}

impl Register {
    pub fn for_clock(clock: &ClockState) -> Self {
        match clock.triadic {
            1 => Register::Expressive,
            2 => Register::Reflective,
            _ => Register::Anticipatory,
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            Register::Expressive => 0.8,
            Register::Reflective => 0.6,
            Register::Anticipatory => 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_zero_resolves_to_observation_default() {
        assert_eq!(select_kind(0, false), ThoughtKind::Observation);
    }

    #[test]
    fn ties_resolve_to_highest_numbered_rule() {
        // 24 is divisible by 3,4,6,8 but not 5,7,11: rule 8 (Planning) wins.
        assert_eq!(select_kind(24, true), ThoughtKind::Planning);
    }

    #[test]
    fn gapped_rules_fall_through_without_knowledge_gaps() {
        // 15 is divisible by 3 and 5, both gated on knowledge gaps.
        assert_eq!(select_kind(15, false), ThoughtKind::Observation);
        assert_eq!(select_kind(15, true), ThoughtKind::Curiosity);
    }

    #[test]
    fn multiple_of_eleven_is_always_wisdom() {
        assert_eq!(select_kind(22, false), ThoughtKind::Wisdom);
        assert_eq!(select_kind(33, true), ThoughtKind::Wisdom);
    }

    #[test]
    fn register_maps_from_triadic_phase() {
        let mut clock = ClockState::initial();
        clock.triadic = 1;
        assert_eq!(Register::for_clock(&clock), Register::Expressive);
        clock.triadic = 2;
        assert_eq!(Register::for_clock(&clock), Register::Reflective);
        clock.triadic = 3;
        assert_eq!(Register::for_clock(&clock), Register::Anticipatory);
    }
}
