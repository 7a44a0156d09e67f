//! Outcome ledger stored as one JSON object per line.
//!
//! Appends are serialized through a mutex and flushed to disk before
//! returning, so concurrent writers in the same process never interleave
//! partial lines. A torn final line left by a crash is terminated before the
//! next record is written, and a failed write is truncated away.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::warn;

use crate::adapters::memory::outcome_repository::select;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{OutcomeFilter, OutcomeRecord};
use crate::domain::ports::OutcomeRepository;

#[derive(Clone)]
pub struct JsonlOutcomeLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl JsonlOutcomeLog {
    /// Open (or create) the ledger file, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> DomainResult<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|e| DomainError::Storage(format!("outcome log mutex poisoned: {e}")))
    }

    fn read_all(&self) -> DomainResult<Vec<OutcomeRecord>> {
        // Hold the writer lock so no half-written line is observed.
        let _guard = self.lock()?;
        let contents = std::fs::read_to_string(&self.path)?;

        let mut records = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<OutcomeRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = number + 1,
                    error = %e,
                    "skipping malformed outcome line"
                ),
            }
        }
        Ok(records)
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[async_trait]
impl OutcomeRepository for JsonlOutcomeLog {
    async fn append(&self, record: &OutcomeRecord) -> DomainResult<()> {
        let json = serde_json::to_string(record)?;
        let mut file = self.lock()?;
        let len = file.metadata()?.len();

        let mut line = String::with_capacity(json.len() + 2);
        if len > 0 && !ends_with_newline(&mut file, len)? {
            line.push('\n');
        }
        line.push_str(&json);
        line.push('\n');

        let written = file
            .write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .and_then(|()| file.sync_data());
        if let Err(e) = written {
            if let Err(rollback) = file.set_len(len) {
                warn!(path = %self.path.display(), error = %rollback, "failed to truncate partial outcome line");
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn query(&self, filter: &OutcomeFilter) -> DomainResult<Vec<OutcomeRecord>> {
        Ok(select(&self.read_all()?, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Outcome, ScoreComponents, WeightVector};

    fn record(category: &str, outcome: Outcome) -> OutcomeRecord {
        OutcomeRecord::new(
            category,
            "apt-get",
            WeightVector::default(),
            ScoreComponents::default(),
            6.0,
            outcome,
        )
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger").join("outcomes.jsonl");

        let first = record("install", Outcome::Success);
        {
            let log = JsonlOutcomeLog::open(&path).unwrap();
            log.append(&first).await.unwrap();
            log.append(&record("deploy", Outcome::Failure)).await.unwrap();
        }

        let reopened = JsonlOutcomeLog::open(&path).unwrap();
        let install = reopened.query(&OutcomeFilter::category("install")).await.unwrap();
        assert_eq!(install, vec![first]);
        assert_eq!(reopened.query(&OutcomeFilter::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcomes.jsonl");
        let log = JsonlOutcomeLog::open(&path).unwrap();
        log.append(&record("install", Outcome::Success)).await.unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{\"truncated\":").unwrap();
        }
        log.append(&record("install", Outcome::Failure)).await.unwrap();

        let stats = log.stats("install").await.unwrap();
        assert_eq!(stats.total, 2);
    }

    #[tokio::test]
    async fn test_append_after_torn_tail_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcomes.jsonl");
        std::fs::write(&path, "{\"id\":\"trunc").unwrap();

        let log = JsonlOutcomeLog::open(&path).unwrap();
        let kept = record("install", Outcome::Success);
        log.append(&kept).await.unwrap();

        let install = log.query(&OutcomeFilter::category("install")).await.unwrap();
        assert_eq!(install, vec![kept]);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with('\n'));
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_line_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlOutcomeLog::open(dir.path().join("outcomes.jsonl")).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&record("build", Outcome::Success)).await })
            })
            .collect();
        let results = futures::future::join_all(handles).await;
        assert!(results.into_iter().all(|r| r.is_ok_and(|appended| appended.is_ok())));

        assert_eq!(log.query(&OutcomeFilter::category("build")).await.unwrap().len(), 16);
    }
}
