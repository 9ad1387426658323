//! JSON file outcome log
//!
//! The whole log is one JSON document. Each append reads it, adds the record
//! and writes it back through a temporary file that is renamed over the
//! original, so a crash mid-write leaves the previous document intact.
//! Appends from one process are serialized; separate processes sharing the
//! file can still lose each other's updates.

use crate::booking::BookingRequest;
use crate::error::{StorageError, StorageResult};
use crate::outcome::{Outcome, OutcomeLog, OutcomeRecords};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Outcome log backed by a JSON file
#[derive(Debug)]
pub struct JsonFileOutcomeLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileOutcomeLog {
    /// Use the log at `path`; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the log document
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> StorageResult<OutcomeRecords> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Outcome log does not exist yet");
                return Ok(OutcomeRecords::default());
            }
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(OutcomeRecords::default());
        }

        serde_json::from_str(&raw).map_err(|e| {
            StorageError::Deserialization(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn write_records(&self, records: &OutcomeRecords) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl OutcomeLog for JsonFileOutcomeLog {
    async fn append(&self, outcome: Outcome, request: BookingRequest) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        records.push(outcome, request);
        self.write_records(&records).await?;

        info!(
            path = %self.path.display(),
            outcome = %outcome,
            successful = records.successful.len(),
            unsuccessful = records.unsuccessful.len(),
            "Recorded booking outcome"
        );
        Ok(())
    }

    async fn load(&self) -> StorageResult<OutcomeRecords> {
        self.read_records().await
    }
}
