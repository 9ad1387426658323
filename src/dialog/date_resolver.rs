//! Date-resolution sub-dialog
//!
//! Keeps asking for a travel date until the answer pins down year, month and
//! day. Departure and return each get their own resolver.

use crate::date::{is_ambiguous, normalize, PartialDate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which travel date a resolver is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Departure,
    Return,
}

impl DateField {
    /// Question asked when the date is missing
    pub fn prompt(&self) -> &'static str {
        match self {
            DateField::Departure => "What is the departure date?",
            DateField::Return => "What is the return date?",
        }
    }

    /// Question asked after an incomplete or unreadable answer
    pub fn reprompt(&self) -> String {
        format!(
            "I'm sorry, for best results, please enter your {} date including the month, day and year.",
            self
        )
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Departure => f.write_str("departure"),
            DateField::Return => f.write_str("return"),
        }
    }
}

/// What the resolver made of an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateResolution {
    /// A definite date; the sub-dialog is over
    Resolved(PartialDate),
    /// Ask again with this message
    Reprompt(String),
}

/// Suspended state of one date sub-dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateResolver {
    field: DateField,
    #[serde(default)]
    attempts: u32,
}

impl DateResolver {
    /// Start resolving `field`
    ///
    /// Returns the resolver and the first question. A prefilled but
    /// ambiguous date opens with the re-prompt.
    pub fn begin(field: DateField, existing: Option<&PartialDate>) -> (Self, String) {
        let prompt = match existing {
            Some(date) if is_ambiguous(date) => {
                debug!(field = %field, date = %date, "Prefilled date is ambiguous");
                field.reprompt()
            }
            _ => field.prompt().to_string(),
        };
        (Self { field, attempts: 0 }, prompt)
    }

    pub fn field(&self) -> DateField {
        self.field
    }

    /// Answers received so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Try to resolve the date from the user's answer
    pub fn resolve(&mut self, answer: &str, today: NaiveDate) -> DateResolution {
        self.attempts += 1;
        match normalize(answer, today) {
            Ok(date) if !is_ambiguous(&date) => DateResolution::Resolved(date),
            Ok(date) => {
                debug!(field = %self.field, date = %date, attempts = self.attempts, "Date still ambiguous");
                DateResolution::Reprompt(self.field.reprompt())
            }
            Err(e) => {
                debug!(field = %self.field, error = %e, attempts = self.attempts, "Could not read date");
                DateResolution::Reprompt(self.field.reprompt())
            }
        }
    }
}
