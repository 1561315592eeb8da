//! The engagement decision and discussion lifecycle (§4.7).

use async_trait::async_trait;
use dte_config::InterestConfig;
use dte_types::LifecycleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementDecision {
    Engage,
    Refuse,
}

/// The narrow view of body state the gate needs; implemented by the
/// lifecycle controller.
#[async_trait]
pub trait FatigueSource: Send + Sync {
    async fn fatigue(&self) -> f32;
}

#[async_trait]
impl FatigueSource for dte_lifecycle::LifecycleController {
    async fn fatigue(&self) -> f32 {
        self.vitals().await.fatigue
    }
}

/// `ConsiderSkill`: decides whether to engage with an incoming message
/// given its interest score, the current lifecycle state, fatigue, and
/// wisdom level, per the engagement decision table.
pub fn consider_skill(
    interest_score: f32,
    state: LifecycleState,
    fatigue: f32,
    wisdom_level: f32,
    cfg: &InterestConfig,
) -> EngagementDecision {
    if state == LifecycleState::Dreaming {
        return EngagementDecision::Refuse;
    }
    if fatigue > cfg.fatigue_refuse {
        return EngagementDecision::Refuse;
    }

    let mut threshold = if state == LifecycleState::Resting {
        cfg.resting_threshold
    } else {
        cfg.base_threshold
    };
    if wisdom_level > cfg.wisdom_discount_level {
        threshold *= cfg.wisdom_discount_factor;
    }

    if interest_score >= threshold {
        EngagementDecision::Engage
    } else {
        EngagementDecision::Refuse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> InterestConfig {
        InterestConfig {
            base_threshold: 0.4,
            resting_threshold: 0.7,
            fatigue_refuse: 0.8,
            wisdom_discount_level: 0.5,
            wisdom_discount_factor: 0.9,
            initiation_interval: std::time::Duration::from_secs(20),
            initiation_min_interest: 0.7,
            initiation_max_fatigue: 0.5,
            max_active_discussions: 3,
            discussion_inactivity_timeout: std::time::Duration::from_secs(300),
            discussion_decay_per_tick: 0.98,
            discussion_min_interest: 0.3,
            discussion_fatigue_limit: 0.8,
            queue_cap: 100,
        }
    }

    #[test]
    fn dreaming_always_refuses() {
        assert_eq!(
            consider_skill(1.0, LifecycleState::Dreaming, 0.0, 0.0, &cfg()),
            EngagementDecision::Refuse
        );
    }

    #[test]
    fn high_fatigue_refuses_regardless_of_interest() {
        assert_eq!(
            consider_skill(1.0, LifecycleState::Awake, 0.9, 0.0, &cfg()),
            EngagementDecision::Refuse
        );
    }

    #[test]
    fn resting_raises_the_threshold() {
        assert_eq!(
            consider_skill(0.5, LifecycleState::Resting, 0.0, 0.0, &cfg()),
            EngagementDecision::Refuse
        );
        assert_eq!(
            consider_skill(0.5, LifecycleState::Awake, 0.0, 0.0, &cfg()),
            EngagementDecision::Engage
        );
    }

    #[test]
    fn high_wisdom_discounts_the_threshold() {
        // base threshold 0.4 * 0.9 = 0.36, so 0.38 now qualifies.
        assert_eq!(
            consider_skill(0.38, LifecycleState::Awake, 0.0, 0.6, &cfg()),
            EngagementDecision::Engage
        );
        assert_eq!(
            consider_skill(0.38, LifecycleState::Awake, 0.0, 0.4, &cfg()),
            EngagementDecision::Refuse
        );
    }
}
