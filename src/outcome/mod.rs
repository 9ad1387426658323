//! Outcome log for finished booking conversations
//!
//! Every booking dialog that reaches its final step is appended to one of
//! two buckets: `successful` when the user confirmed, `unsuccessful` when
//! they declined. The log only ever grows.

use crate::booking::BookingRequest;
use crate::error::StorageResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod file;
pub mod memory;
pub mod report;

pub use file::JsonFileOutcomeLog;
pub use memory::InMemoryOutcomeLog;
pub use report::{acceptance_rate, PerformanceReport};

/// How a booking conversation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// User confirmed the booking
    Accepted,
    /// User declined at confirmation
    Abandoned,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted => f.write_str("accepted"),
            Outcome::Abandoned => f.write_str("abandoned"),
        }
    }
}

/// The persisted document: two append-only buckets of booking records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecords {
    /// Accepted bookings
    #[serde(default, alias = "successfull")]
    pub successful: Vec<BookingRequest>,

    /// Abandoned bookings
    #[serde(default, alias = "unsuccessfull")]
    pub unsuccessful: Vec<BookingRequest>,
}

impl OutcomeRecords {
    /// Append a record to the bucket for `outcome`
    pub fn push(&mut self, outcome: Outcome, request: BookingRequest) {
        match outcome {
            Outcome::Accepted => self.successful.push(request),
            Outcome::Abandoned => self.unsuccessful.push(request),
        }
    }

    /// Records in the bucket for `outcome`
    pub fn bucket(&self, outcome: Outcome) -> &[BookingRequest] {
        match outcome {
            Outcome::Accepted => &self.successful,
            Outcome::Abandoned => &self.unsuccessful,
        }
    }

    /// Total number of finished conversations
    pub fn len(&self) -> usize {
        self.successful.len() + self.unsuccessful.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for outcome log backends
///
/// Implementations only ever append; nothing is rewritten or removed.
#[async_trait]
pub trait OutcomeLog: Send + Sync {
    /// Append a finished booking to the bucket for `outcome`
    async fn append(&self, outcome: Outcome, request: BookingRequest) -> StorageResult<()>;

    /// Read the whole log
    async fn load(&self) -> StorageResult<OutcomeRecords>;
}
