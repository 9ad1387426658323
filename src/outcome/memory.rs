//! In-memory outcome log
//!
//! Keeps the records behind an async RwLock. Nothing survives a restart; use
//! it for tests and throwaway runs.

use crate::booking::BookingRequest;
use crate::error::StorageResult;
use crate::outcome::{Outcome, OutcomeLog, OutcomeRecords};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory outcome log
///
/// Cloning shares the underlying records.
///
/// # Examples
///
/// ```
/// use flyme::booking::BookingRequest;
/// use flyme::outcome::{InMemoryOutcomeLog, Outcome, OutcomeLog};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let log = InMemoryOutcomeLog::new();
///     log.append(Outcome::Accepted, BookingRequest::new().with_origin("Paris")).await?;
///
///     let records = log.load().await?;
///     assert_eq!(records.successful.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutcomeLog {
    records: Arc<RwLock<OutcomeRecords>>,
}

impl InMemoryOutcomeLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across both buckets
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Check if nothing has been recorded
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OutcomeLog for InMemoryOutcomeLog {
    async fn append(&self, outcome: Outcome, request: BookingRequest) -> StorageResult<()> {
        self.records.write().await.push(outcome, request);
        Ok(())
    }

    async fn load(&self) -> StorageResult<OutcomeRecords> {
        Ok(self.records.read().await.clone())
    }
}
