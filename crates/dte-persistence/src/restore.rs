//! Startup restore: loads the last checkpoint (if any), verifies its
//! identity signature, and distributes the recovered state into the
//! live modules that need it.

use dte_types::{Checkpoint, ClockState, Counters, Goal, Identity, Thought, VitalSigns, WisdomPrinciple, CHECKPOINT_VERSION};
use tracing::warn;

use crate::error::{PersistenceError, PersistenceResult};
use crate::identity::{birth, verify};
use crate::store::CheckpointStore;

/// Everything a fresh or restored run needs before the first clock tick.
pub struct RestoreOutcome {
    pub identity: Identity,
    pub counters: Counters,
    pub thoughts: Vec<Thought>,
    pub interests: std::collections::HashMap<String, dte_types::InterestScore>,
    pub goals: Vec<Goal>,
    pub principles: Vec<WisdomPrinciple>,
    pub vital_signs: VitalSigns,
    pub clock: ClockState,
    pub wisdom_level: f32,
    pub restored_from_checkpoint: bool,
}

impl RestoreOutcome {
    fn fresh(core_values: Vec<String>) -> Self {
        Self {
            identity: birth(core_values),
            counters: Counters::default(),
            thoughts: Vec::new(),
            interests: Default::default(),
            goals: Vec::new(),
            principles: Vec::new(),
            vital_signs: VitalSigns::fresh(),
            clock: ClockState::initial(),
            wisdom_level: 0.0,
            restored_from_checkpoint: false,
        }
    }

    fn from_checkpoint(mut checkpoint: Checkpoint) -> Self {
        for thought in &mut checkpoint.thoughts {
            thought.restored = true;
        }
        Self {
            identity: checkpoint.identity,
            counters: checkpoint.counters,
            thoughts: checkpoint.thoughts,
            interests: checkpoint.interests,
            goals: checkpoint.goals,
            principles: checkpoint.principles,
            vital_signs: checkpoint.vital_signs,
            clock: checkpoint.clock,
            wisdom_level: checkpoint.wisdom_level,
            restored_from_checkpoint: true,
        }
    }
}

/// Loads the checkpoint at `store`'s path if present and its identity
/// signature still checks out; otherwise starts a fresh identity with
/// `core_values`.
///
/// A missing file, an I/O read failure, or a signature mismatch all
/// downgrade to a fresh-start warning. A file that exists but is
/// syntactically invalid is different: with `dte_config::safe_mode()` on
/// (the default) it is only discarded when the operator has explicitly
/// asked for that via `dte_config::reset_on_corrupt_checkpoint`; otherwise
/// the corruption is propagated so the caller can fail the process (exit
/// code 2) instead of silently losing state.
pub async fn restore_or_init(store: &CheckpointStore, core_values: Vec<String>) -> PersistenceResult<RestoreOutcome> {
    match store.load().await {
        Ok(Some(checkpoint)) => {
            if checkpoint.version != CHECKPOINT_VERSION {
                warn!(
                    found = checkpoint.version,
                    expected = CHECKPOINT_VERSION,
                    "checkpoint schema version mismatch, starting fresh"
                );
                return Ok(RestoreOutcome::fresh(core_values));
            }
            if !verify(&checkpoint.identity) {
                warn!("checkpoint identity signature does not match, starting fresh");
                return Ok(RestoreOutcome::fresh(core_values));
            }
            Ok(RestoreOutcome::from_checkpoint(checkpoint))
        }
        Ok(None) => Ok(RestoreOutcome::fresh(core_values)),
        Err(PersistenceError::Serialization(err)) => {
            let may_reset = !dte_config::safe_mode() || dte_config::reset_on_corrupt_checkpoint();
            if may_reset {
                warn!("checkpoint file is syntactically invalid, resetting on explicit operator request: {err}");
                Ok(RestoreOutcome::fresh(core_values))
            } else {
                Err(PersistenceError::Serialization(err))
            }
        }
        Err(err) => {
            warn!("failed to read checkpoint, starting fresh: {err}");
            Ok(RestoreOutcome::fresh(core_values))
        }
    }
}

/// Replays the recovered thoughts and interests into live module state.
/// Called once at startup, after `restore_or_init`.
pub async fn distribute(outcome: &RestoreOutcome, thoughts: &dte_stream::ThoughtBuffer, interests: &dte_interest::InterestMap) {
    for thought in &outcome.thoughts {
        thoughts.push(thought.clone()).await;
    }
    interests.restore(outcome.interests.clone()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_types::{ThoughtKind, ThoughtSource};

    #[tokio::test]
    async fn no_checkpoint_yields_a_fresh_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        let outcome = restore_or_init(&store, vec!["curiosity".into()]).await.unwrap();
        assert!(!outcome.restored_from_checkpoint);
        assert!(verify(&outcome.identity));
    }

    #[tokio::test]
    async fn tampered_checkpoint_falls_back_to_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        let mut checkpoint = sample_checkpoint();
        checkpoint.identity.core_values.push("tampered".into());
        store.save(&checkpoint).await.unwrap();

        let outcome = restore_or_init(&store, vec!["curiosity".into()]).await.unwrap();
        assert!(!outcome.restored_from_checkpoint);
    }

    #[tokio::test]
    async fn restored_thoughts_are_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        let mut checkpoint = sample_checkpoint();
        checkpoint.thoughts.push(Thought::new(
            1,
            "hello",
            ThoughtKind::Observation,
            0.5,
            vec![],
            ThoughtSource::Internal,
            ClockState::initial(),
        ));
        store.save(&checkpoint).await.unwrap();

        let outcome = restore_or_init(&store, vec!["curiosity".into()]).await.unwrap();
        assert!(outcome.restored_from_checkpoint);
        assert!(outcome.thoughts[0].restored);
    }

    #[tokio::test]
    async fn corrupt_checkpoint_propagates_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("state.json");
        tokio::fs::write(&state_file, b"not valid json").await.unwrap();
        let store = CheckpointStore::new(state_file);

        let result = restore_or_init(&store, vec!["curiosity".into()]).await;
        assert!(matches!(result, Err(PersistenceError::Serialization(_))));
    }

    #[tokio::test]
    async fn corrupt_checkpoint_resets_when_operator_opts_in() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("state.json");
        tokio::fs::write(&state_file, b"not valid json").await.unwrap();
        let store = CheckpointStore::new(state_file);

        std::env::set_var("DTE_RESET_CORRUPT_CHECKPOINT", "true");
        let result = restore_or_init(&store, vec!["curiosity".into()]).await;
        std::env::remove_var("DTE_RESET_CORRUPT_CHECKPOINT");

        let outcome = result.unwrap();
        assert!(!outcome.restored_from_checkpoint);
    }

    fn sample_checkpoint() -> Checkpoint {
        let identity = birth(vec!["curiosity".into()]);
        Checkpoint {
            version: CHECKPOINT_VERSION,
            timestamp: chrono::Utc::now(),
            identity,
            counters: Counters::default(),
            thoughts: vec![],
            interests: Default::default(),
            goals: vec![],
            principles: vec![],
            vital_signs: VitalSigns::fresh(),
            clock: ClockState::initial(),
            wisdom_level: 0.0,
        }
    }
}
