//! Acceptance-rate reporting over the outcome log

use crate::outcome::OutcomeRecords;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of finished conversations that ended in a booking, in percent
///
/// Rounded to two decimals. `None` when nothing has been recorded.
pub fn acceptance_rate(records: &OutcomeRecords) -> Option<f64> {
    let total = records.len();
    if total == 0 {
        return None;
    }
    let rate = records.successful.len() as f64 / total as f64 * 100.0;
    Some((rate * 100.0).round() / 100.0)
}

/// Summary of the outcome log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub successful: usize,
    pub unsuccessful: usize,
    pub acceptance_rate: Option<f64>,
}

impl From<&OutcomeRecords> for PerformanceReport {
    fn from(records: &OutcomeRecords) -> Self {
        Self {
            successful: records.successful.len(),
            unsuccessful: records.unsuccessful.len(),
            acceptance_rate: acceptance_rate(records),
        }
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.acceptance_rate {
            Some(rate) => write!(f, "Bot success rate: {:.2}%", rate),
            None => write!(f, "Bot success rate: no finished conversations yet"),
        }
    }
}
