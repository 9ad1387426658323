//! The booking request draft filled in by the booking dialog

use crate::date::PartialDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot-filling draft for one booking conversation
///
/// Field names on the wire (`or_city`, `dst_city`, ...) are the ones used by
/// the outcome log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Origin city
    #[serde(rename = "or_city", default)]
    pub origin_city: Option<String>,

    /// Destination city
    #[serde(rename = "dst_city", default)]
    pub destination_city: Option<String>,

    /// Budget, kept as the user wrote it
    #[serde(default)]
    pub budget: Option<String>,

    /// Departure date
    #[serde(rename = "str_date", default)]
    pub departure_date: Option<PartialDate>,

    /// Return date
    #[serde(rename = "end_date", default)]
    pub return_date: Option<PartialDate>,

    /// Prompts and answers in the order they happened
    #[serde(default)]
    pub turns: Vec<String>,
}

impl BookingRequest {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(mut self, city: impl Into<String>) -> Self {
        self.origin_city = Some(city.into());
        self
    }

    pub fn with_destination(mut self, city: impl Into<String>) -> Self {
        self.destination_city = Some(city.into());
        self
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = Some(budget.into());
        self
    }

    pub fn with_departure(mut self, date: PartialDate) -> Self {
        self.departure_date = Some(date);
        self
    }

    pub fn with_return(mut self, date: PartialDate) -> Self {
        self.return_date = Some(date);
        self
    }

    /// Append a prompt or answer to the transcript
    pub fn record_turn(&mut self, turn: impl Into<String>) {
        self.turns.push(turn.into());
    }

    /// All five slots set and both dates definite
    pub fn is_complete(&self) -> bool {
        self.origin_city.is_some()
            && self.destination_city.is_some()
            && self.budget.is_some()
            && self.departure_date.is_some_and(|d| d.is_definite())
            && self.return_date.is_some_and(|d| d.is_definite())
    }

    /// True when no slot has been filled yet
    pub fn is_empty(&self) -> bool {
        self.origin_city.is_none()
            && self.destination_city.is_none()
            && self.budget.is_none()
            && self.departure_date.is_none()
            && self.return_date.is_none()
    }
}

fn or_unknown<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "?".to_string())
}

impl fmt::Display for BookingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} to {}, budget {})",
            or_unknown(&self.origin_city),
            or_unknown(&self.destination_city),
            or_unknown(&self.departure_date),
            or_unknown(&self.return_date),
            or_unknown(&self.budget),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> PartialDate {
        s.parse().unwrap()
    }

    fn full_request() -> BookingRequest {
        BookingRequest::new()
            .with_origin("Paris")
            .with_destination("Marseille")
            .with_budget("$500")
            .with_departure(date("2022-10-10"))
            .with_return(date("2022-11-10"))
    }

    #[test]
    fn test_new_request_is_empty() {
        let request = BookingRequest::new();
        assert!(request.is_empty());
        assert!(!request.is_complete());
        assert!(request.turns.is_empty());
    }

    #[test]
    fn test_complete_request() {
        assert!(full_request().is_complete());
    }

    #[test]
    fn test_ambiguous_date_makes_request_incomplete() {
        let request = full_request().with_return(date("2022-11-XX"));
        assert!(!request.is_complete());
        assert!(!request.is_empty());
    }

    #[test]
    fn test_missing_budget_makes_request_incomplete() {
        let mut request = full_request();
        request.budget = None;
        assert!(!request.is_complete());
    }

    #[test]
    fn test_record_turn_keeps_order() {
        let mut request = BookingRequest::new();
        request.record_turn("From what city will you be travelling?");
        request.record_turn("Paris");
        assert_eq!(
            request.turns,
            vec!["From what city will you be travelling?", "Paris"]
        );
    }

    #[test]
    fn test_serializes_with_outcome_log_keys() {
        let json = serde_json::to_value(full_request()).unwrap();
        assert_eq!(json["or_city"], "Paris");
        assert_eq!(json["dst_city"], "Marseille");
        assert_eq!(json["budget"], "$500");
        assert_eq!(json["str_date"], "2022-10-10");
        assert_eq!(json["end_date"], "2022-11-10");
        assert!(json["turns"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_deserializes_sparse_record() {
        let request: BookingRequest =
            serde_json::from_str(r#"{"or_city": "Paris", "end_date": null}"#).unwrap();
        assert_eq!(request.origin_city.as_deref(), Some("Paris"));
        assert!(request.return_date.is_none());
        assert!(request.turns.is_empty());
    }

    #[test]
    fn test_display_marks_missing_slots() {
        let request = BookingRequest::new().with_origin("Paris");
        assert_eq!(request.to_string(), "Paris -> ? (? to ?, budget ?)");
    }
}
