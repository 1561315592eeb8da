//! Centralized, environment-driven configuration for Deep Tree Echo.
//!
//! Every tunable named "(configurable)" in the specification is read from
//! an environment variable with a typed default here, following the same
//! `VAR_with_default` convention the rest of the corpus uses for process
//! configuration (no remote control plane, no config server).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Reads a boolean environment variable, defaulting when unset or
/// unparsable.
fn bool_env(var: &str, default: bool) -> bool {
    env::var(var)
        .ok()
        .map(|v| v.to_lowercase())
        .map(|v| matches!(v.as_str(), "1" | "true" | "t" | "yes" | "y"))
        .unwrap_or(default)
}

fn f32_env(var: &str, default: f32) -> f32 {
    env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn u64_env(var: &str, default: u64) -> u64 {
    env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn u32_env(var: &str, default: u32) -> u32 {
    env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn usize_env(var: &str, default: usize) -> usize {
    env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn string_env(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Clock & engine pacing.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Wall-clock duration of one scheduler step.
    pub step_duration: Duration,
    /// Number of concurrent cognitive engines (`N >= 3`).
    pub engine_count: usize,
    /// Phase offsets (steps within the 12-step sub-cycle) for each engine.
    pub engine_offsets: Vec<u32>,
    /// Engine task-history ring buffer capacity.
    pub engine_history_cap: usize,
    /// Engine cadence bounds for adaptive pacing.
    pub engine_min_cadence: Duration,
    pub engine_max_cadence: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            step_duration: Duration::from_millis(u64_env("DTE_STEP_DURATION_MS", 2000)),
            engine_count: usize_env("DTE_ENGINE_COUNT", 3),
            engine_offsets: vec![0, 4, 8],
            engine_history_cap: usize_env("DTE_ENGINE_HISTORY_CAP", 64),
            engine_min_cadence: Duration::from_millis(500),
            engine_max_cadence: Duration::from_millis(10_000),
        }
    }
}

/// Thought stream pacing.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub cadence: Duration,
    pub buffer_cap: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(u64_env("DTE_THOUGHT_CADENCE_MS", 10_000)),
            buffer_cap: usize_env("DTE_THOUGHT_BUFFER_CAP", 100),
        }
    }
}

/// Event bus backpressure.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub subscriber_queue_depth: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_depth: usize_env("DTE_BUS_QUEUE_DEPTH", 256),
        }
    }
}

/// Wake/rest/dream thresholds, all defaults per §4.5.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub energy_low: f32,
    pub fatigue_high: f32,
    pub cycles_since_rest_max: u64,
    pub tiring_settle: Duration,
    pub dream_min: Duration,
    pub dream_max: Duration,
    pub resting_energy_high: f32,
    pub resting_fatigue_low: f32,
    pub transitioning_duration: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            energy_low: f32_env("DTE_ENERGY_LOW", 0.3),
            fatigue_high: f32_env("DTE_FATIGUE_HIGH", 0.7),
            cycles_since_rest_max: u64_env("DTE_CYCLES_SINCE_REST_MAX", 20),
            tiring_settle: Duration::from_secs(u64_env("DTE_TIRING_SETTLE_SECS", 5)),
            dream_min: Duration::from_secs(u64_env("DTE_DREAM_MIN_SECS", 30)),
            dream_max: Duration::from_secs(u64_env("DTE_DREAM_MAX_SECS", 120)),
            resting_energy_high: f32_env("DTE_RESTING_ENERGY_HIGH", 0.6),
            resting_fatigue_low: f32_env("DTE_RESTING_FATIGUE_LOW", 0.4),
            transitioning_duration: Duration::from_millis(u64_env("DTE_TRANSITIONING_MS", 500)),
            heartbeat_interval: Duration::from_millis(u64_env("DTE_HEARTBEAT_MS", 1000)),
        }
    }
}

/// Dream consolidator bounds.
#[derive(Debug, Clone)]
pub struct ConsolidatorConfig {
    pub min_theme_frequency: u32,
    pub min_theme_importance: f32,
    pub coherence_emergence_threshold: f32,
    pub wall_clock_bound: Duration,
    pub episode_window: Duration,
}

impl Default for ConsolidatorConfig {
    fn default() -> Self {
        Self {
            min_theme_frequency: u32_env("DTE_MIN_THEME_FREQUENCY", 3),
            min_theme_importance: f32_env("DTE_MIN_THEME_IMPORTANCE", 0.5),
            coherence_emergence_threshold: f32_env("DTE_EMERGENCE_COHERENCE", 0.7),
            wall_clock_bound: Duration::from_secs(u64_env("DTE_CONSOLIDATOR_WALL_CLOCK_SECS", 120)),
            episode_window: Duration::from_secs(u64_env("DTE_EPISODE_WINDOW_SECS", 24 * 3600)),
        }
    }
}

/// Interest & discussion gate tunables.
#[derive(Debug, Clone)]
pub struct InterestConfig {
    pub base_threshold: f32,
    pub resting_threshold: f32,
    pub fatigue_refuse: f32,
    pub wisdom_discount_level: f32,
    pub wisdom_discount_factor: f32,
    pub initiation_interval: Duration,
    pub initiation_min_interest: f32,
    pub initiation_max_fatigue: f32,
    pub max_active_discussions: usize,
    pub discussion_inactivity_timeout: Duration,
    pub discussion_decay_per_tick: f32,
    pub discussion_min_interest: f32,
    pub discussion_fatigue_limit: f32,
    pub queue_cap: usize,
}

impl Default for InterestConfig {
    fn default() -> Self {
        Self {
            base_threshold: f32_env("DTE_INTEREST_BASE_THRESHOLD", 0.4),
            resting_threshold: f32_env("DTE_INTEREST_RESTING_THRESHOLD", 0.7),
            fatigue_refuse: f32_env("DTE_INTEREST_FATIGUE_REFUSE", 0.8),
            wisdom_discount_level: f32_env("DTE_WISDOM_DISCOUNT_LEVEL", 0.5),
            wisdom_discount_factor: f32_env("DTE_WISDOM_DISCOUNT_FACTOR", 0.9),
            initiation_interval: Duration::from_secs(u64_env("DTE_INITIATION_INTERVAL_SECS", 20)),
            initiation_min_interest: f32_env("DTE_INITIATION_MIN_INTEREST", 0.7),
            initiation_max_fatigue: f32_env("DTE_INITIATION_MAX_FATIGUE", 0.5),
            max_active_discussions: usize_env("DTE_MAX_ACTIVE_DISCUSSIONS", 3),
            discussion_inactivity_timeout: Duration::from_secs(u64_env(
                "DTE_DISCUSSION_INACTIVITY_TIMEOUT_SECS",
                300,
            )),
            discussion_decay_per_tick: f32_env("DTE_DISCUSSION_DECAY_PER_TICK", 0.98),
            discussion_min_interest: f32_env("DTE_DISCUSSION_MIN_INTEREST", 0.3),
            discussion_fatigue_limit: f32_env("DTE_DISCUSSION_FATIGUE_LIMIT", 0.8),
            queue_cap: usize_env("DTE_DISCUSSION_QUEUE_CAP", 100),
        }
    }
}

/// Wisdom synthesizer tunables.
#[derive(Debug, Clone)]
pub struct WisdomConfig {
    pub pattern_threshold: usize,
    pub synthesis_tick: Duration,
    pub synthesis_tick_min_patterns: usize,
    pub evolution_tick: Duration,
    pub evolution_min_apply_count: u32,
    pub evolution_effectiveness_low: f32,
    pub evolution_effectiveness_high: f32,
    pub application_tick: Duration,
    pub relation_strength_threshold: f32,
}

impl Default for WisdomConfig {
    fn default() -> Self {
        Self {
            pattern_threshold: usize_env("DTE_WISDOM_PATTERN_THRESHOLD", 5),
            synthesis_tick: Duration::from_secs(u64_env("DTE_WISDOM_SYNTHESIS_TICK_SECS", 5 * 60)),
            synthesis_tick_min_patterns: usize_env("DTE_WISDOM_SYNTHESIS_TICK_MIN_PATTERNS", 3),
            evolution_tick: Duration::from_secs(u64_env("DTE_WISDOM_EVOLUTION_TICK_SECS", 15 * 60)),
            evolution_min_apply_count: u32_env("DTE_WISDOM_EVOLUTION_MIN_APPLY_COUNT", 3),
            evolution_effectiveness_low: f32_env("DTE_WISDOM_EVOLUTION_EFFECTIVENESS_LOW", 0.4),
            evolution_effectiveness_high: f32_env("DTE_WISDOM_EVOLUTION_EFFECTIVENESS_HIGH", 0.8),
            application_tick: Duration::from_secs(u64_env("DTE_WISDOM_APPLICATION_TICK_SECS", 2 * 60)),
            relation_strength_threshold: f32_env("DTE_WISDOM_RELATION_STRENGTH_THRESHOLD", 0.3),
        }
    }
}

/// Provider call discipline.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub deadline: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(u64_env("DTE_PROVIDER_DEADLINE_SECS", 30)),
            max_retries: u32_env("DTE_PROVIDER_MAX_RETRIES", 3),
            backoff_base: Duration::from_secs(u64_env("DTE_PROVIDER_BACKOFF_BASE_SECS", 1)),
        }
    }
}

/// Persistence tunables.
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub state_file: PathBuf,
    pub checkpoint_interval: Duration,
    pub session_log_file: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        let data_dir = deep_tree_echo_data_dir();
        Self {
            state_file: data_dir.join(string_env(
                "DTE_STATE_FILE_NAME",
                "deep_tree_echo_state.json",
            )),
            checkpoint_interval: Duration::from_secs(u64_env(
                "DTE_CHECKPOINT_INTERVAL_SECS",
                15 * 60,
            )),
            session_log_file: data_dir.join("deep_tree_echo_sessions.csv"),
        }
    }
}

/// Data directory: `DTE_DATA_DIR`, else `~/.deep-tree-echo`, else `./deep-tree-echo-data`.
pub fn deep_tree_echo_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("DTE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs_home() {
        return home.join(".deep-tree-echo");
    }
    PathBuf::from("deep-tree-echo-data")
}

/// Minimal home-directory lookup so the crate doesn't need a `dirs`
/// dependency for one call site.
fn dirs_home() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// SAFE_MODE: when set, destructive/irreversible actions (forced
/// fresh-start on corrupt checkpoint, etc.) require an explicit operator
/// override rather than happening implicitly.
pub fn safe_mode() -> bool {
    bool_env("DTE_SAFE_MODE", true)
}

/// The operator's explicit override for a checkpoint file that exists but
/// fails to parse: unset (the default, with `safe_mode()` on) means the
/// process reports the corruption rather than silently discarding state.
pub fn reset_on_corrupt_checkpoint() -> bool {
    bool_env("DTE_RESET_CORRUPT_CHECKPOINT", false)
}

/// The aggregate configuration for one orchestrator instance.
#[derive(Debug, Clone, Default)]
pub struct DteConfig {
    pub clock: ClockConfig,
    pub stream: StreamConfig,
    pub bus: BusConfig,
    pub lifecycle: LifecycleConfig,
    pub consolidator: ConsolidatorConfig,
    pub interest: InterestConfig,
    pub wisdom: WisdomConfig,
    pub provider: ProviderConfig,
    pub persistence: PersistenceConfig,
}

impl DteConfig {
    /// Loads configuration from the process environment, falling back to
    /// the documented defaults for anything unset.
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = DteConfig::from_env();
        assert_eq!(cfg.clock.engine_count, 3);
        assert_eq!(cfg.clock.engine_offsets, vec![0, 4, 8]);
        assert_eq!(cfg.lifecycle.cycles_since_rest_max, 20);
        assert_eq!(cfg.wisdom.pattern_threshold, 5);
        assert_eq!(cfg.interest.max_active_discussions, 3);
    }

    #[test]
    fn safe_mode_defaults_true() {
        assert!(safe_mode());
    }
}
