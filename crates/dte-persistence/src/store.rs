//! Atomic checkpoint I/O: writes go to a temp file in the same directory,
//! fsync, then rename over the real path so a crash mid-write never
//! leaves a half-written checkpoint.

use std::path::{Path, PathBuf};

use dte_types::Checkpoint;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{PersistenceError, PersistenceResult};

pub struct CheckpointStore {
    state_file: PathBuf,
}

impl CheckpointStore {
    pub fn new(state_file: PathBuf) -> Self {
        Self { state_file }
    }

    pub async fn save(&self, checkpoint: &Checkpoint) -> PersistenceResult<()> {
        if let Some(dir) = self.state_file.parent() {
            fs::create_dir_all(dir).await?;
        }
        let body = serde_json::to_vec_pretty(checkpoint)?;
        let tmp_path = tmp_path_for(&self.state_file);

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.state_file).await?;
        info!(step = checkpoint.clock.step, "checkpoint saved");
        Ok(())
    }

    pub async fn load(&self) -> PersistenceResult<Option<Checkpoint>> {
        if !self.state_file.exists() {
            return Ok(None);
        }
        let body = fs::read(&self.state_file).await?;
        match serde_json::from_slice(&body) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(err) => {
                warn!("checkpoint file is unreadable, starting fresh: {err}");
                Err(PersistenceError::Serialization(err))
            }
        }
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dte_types::{Checkpoint, Counters, Identity};
    use dte_types::{ClockState, VitalSigns, CHECKPOINT_VERSION};

    fn sample() -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            timestamp: chrono::Utc::now(),
            identity: Identity {
                signature: "abc".into(),
                birth_time: chrono::Utc::now(),
                core_values: vec!["curiosity".into()],
            },
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

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        let checkpoint = sample();
        store.save(&checkpoint).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("does-not-exist.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_temp_file_survives_a_successful_save() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("state.json");
        let store = CheckpointStore::new(state_file.clone());
        store.save(&sample()).await.unwrap();
        assert!(!tmp_path_for(&state_file).exists());
        assert!(state_file.exists());
    }
}
