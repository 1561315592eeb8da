//! Append-only session log: one row per completed run, written as CSV so
//! it stays grep-able without any tooling.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::PersistenceResult;

const HEADER: &str = "session_n,start,end,uptime_secs,cycles,thoughts,wisdom_delta\n";

pub struct SessionLog {
    path: PathBuf,
}

/// Marks the moment a session began; handed back to `record_end` once the
/// session is over.
#[derive(Debug, Clone, Copy)]
pub struct SessionHandle {
    pub session_n: u64,
    pub start: DateTime<Utc>,
}

impl SessionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn begin(&self, session_n: u64) -> SessionHandle {
        SessionHandle {
            session_n,
            start: Utc::now(),
        }
    }

    pub async fn record_end(
        &self,
        handle: SessionHandle,
        cycles: u64,
        thoughts: u64,
        wisdom_delta: f32,
    ) -> PersistenceResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let is_new = !self.path.exists();
        let end = Utc::now();
        let uptime_secs = (end - handle.start).num_seconds().max(0);

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        if is_new {
            file.write_all(HEADER.as_bytes()).await?;
        }
        let line = format!(
            "{},{},{},{},{},{},{:.4}\n",
            handle.session_n,
            handle.start.to_rfc3339(),
            end.to_rfc3339(),
            uptime_secs,
            cycles,
            thoughts,
            wisdom_delta
        );
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_header_once_and_one_row_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("sessions.csv"));

        let first = log.begin(1);
        log.record_end(first, 10, 20, 0.05).await.unwrap();

        let second = log.begin(2);
        log.record_end(second, 5, 8, 0.01).await.unwrap();

        let contents = tokio::fs::read_to_string(dir.path().join("sessions.csv")).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER.trim_end());
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
    }
}
