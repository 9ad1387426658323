//! Turning recognizer output into a booking draft

use crate::booking::BookingRequest;
use crate::date::normalize;
use crate::error::DateError;
use crate::recognizer::{Recognizer, RecognizerResult};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Intent label the booking model uses for "book a flight"
pub const BOOK_FLIGHT_INTENT: &str = "book";

/// Outcome of running the extractor on one utterance
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Booking intent matched; slots found in the utterance are prefilled
    Booking(BookingRequest),

    /// Top intent was something else (or there was none)
    NoIntent(Option<String>),

    /// The service call or the reshaping of its answer failed
    Failed(String),
}

impl Extraction {
    /// The draft, if the booking intent matched
    pub fn booking(&self) -> Option<&BookingRequest> {
        match self {
            Extraction::Booking(request) => Some(request),
            _ => None,
        }
    }
}

/// Capitalize a city name: first character upper case, the rest lower case
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn build_request(result: &RecognizerResult, today: NaiveDate) -> Result<BookingRequest, DateError> {
    let mut request = BookingRequest::new();

    request.origin_city = result.first_entity("or_city").map(capitalize);
    request.destination_city = result.first_entity("dst_city").map(capitalize);
    request.budget = result.first_entity("budget").map(str::to_string);
    request.departure_date = result
        .first_entity("str_date")
        .map(|text| normalize(text, today))
        .transpose()?;
    request.return_date = result
        .first_entity("end_date")
        .map(|text| normalize(text, today))
        .transpose()?;

    Ok(request)
}

/// Reshape a recognizer result into a booking draft
///
/// Pure: the same result and reference day always give the same extraction.
pub fn extract(result: &RecognizerResult, today: NaiveDate) -> Extraction {
    let top = result.top_intent().map(|(label, _)| label.to_string());

    if top.as_deref() != Some(BOOK_FLIGHT_INTENT) {
        debug!(intent = ?top, "Top intent is not a booking");
        return Extraction::NoIntent(top);
    }

    match build_request(result, today) {
        Ok(request) => {
            debug!(draft = %request, "Extracted booking draft");
            Extraction::Booking(request)
        }
        Err(e) => {
            warn!(error = %e, utterance = %result.text, "Could not extract booking slots");
            Extraction::Failed(e.to_string())
        }
    }
}

/// Query the recognizer and extract a booking draft
///
/// Recognizer failures are logged and reported as [`Extraction::Failed`];
/// they never fail the turn.
pub async fn execute_query(
    recognizer: &dyn Recognizer,
    utterance: &str,
    today: NaiveDate,
) -> Extraction {
    match recognizer.recognize(utterance).await {
        Ok(result) => {
            let extraction = extract(&result, today);
            info!(
                recognizer = recognizer.name(),
                intent = ?result.top_intent().map(|(label, _)| label),
                prefilled = extraction.booking().map(|r| !r.is_empty()).unwrap_or(false),
                "Recognized utterance"
            );
            extraction
        }
        Err(e) => {
            warn!(recognizer = recognizer.name(), error = %e, "Recognizer call failed");
            Extraction::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognizerError;
    use async_trait::async_trait;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 6, 1).unwrap()
    }

    fn booking(text: &str) -> RecognizerResult {
        RecognizerResult::new(text)
            .with_intent(BOOK_FLIGHT_INTENT, 0.97)
            .with_intent("NoneIntent", 0.02)
    }

    #[test]
    fn test_non_booking_intent_yields_no_draft() {
        let result = RecognizerResult::new("hello")
            .with_intent("greet", 0.8)
            .with_intent(BOOK_FLIGHT_INTENT, 0.1)
            .with_entity("or_city", "paris");

        assert_eq!(
            extract(&result, today()),
            Extraction::NoIntent(Some("greet".to_string()))
        );
    }

    #[test]
    fn test_no_intents_yields_no_draft() {
        assert_eq!(
            extract(&RecognizerResult::new("..."), today()),
            Extraction::NoIntent(None)
        );
    }

    #[test]
    fn test_cities_are_capitalized_first_candidate() {
        let result = booking("I want to book a flight from marseille to paris")
            .with_entity("or_city", "marseille")
            .with_entity("or_city", "lyon")
            .with_entity("dst_city", "PARIS");

        let request = extract(&result, today()).booking().cloned().unwrap();
        assert_eq!(request.origin_city.as_deref(), Some("Marseille"));
        assert_eq!(request.destination_city.as_deref(), Some("Paris"));
        assert!(request.budget.is_none());
        assert!(request.departure_date.is_none());
    }

    #[test]
    fn test_budget_is_kept_verbatim() {
        let result = booking("I want to spend maximum $500").with_entity("budget", "$ 500");
        let request = extract(&result, today()).booking().cloned().unwrap();
        assert_eq!(request.budget.as_deref(), Some("$ 500"));
    }

    #[test]
    fn test_dates_are_normalized() {
        let result = booking("from the 12 aug 2022 until 15 september")
            .with_entity("str_date", "12 aug 2022")
            .with_entity("end_date", "15 september");

        let request = extract(&result, today()).booking().cloned().unwrap();
        assert_eq!(request.departure_date.unwrap().to_string(), "2022-08-12");
        assert_eq!(request.return_date.unwrap().to_string(), "XXXX-09-15");
    }

    #[test]
    fn test_unparsable_date_fails_extraction() {
        let result = booking("leaving someday").with_entity("str_date", "someday");
        assert!(matches!(extract(&result, today()), Extraction::Failed(_)));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let result = booking("book paris to rome")
            .with_entity("or_city", "paris")
            .with_entity("dst_city", "rome")
            .with_entity("str_date", "september 2022");

        let first = extract(&result, today());
        let second = extract(&result, today());
        assert_eq!(first, second);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("paris"), "Paris");
        assert_eq!(capitalize("NEW YORK"), "New york");
        assert_eq!(capitalize("écully"), "Écully");
        assert_eq!(capitalize(""), "");
    }

    struct FailingRecognizer;

    #[async_trait]
    impl Recognizer for FailingRecognizer {
        async fn recognize(&self, _utterance: &str) -> Result<RecognizerResult, RecognizerError> {
            Err(RecognizerError::Status {
                status: 401,
                body: "Access denied due to invalid subscription key".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_execute_query_absorbs_recognizer_failure() {
        let extraction = execute_query(&FailingRecognizer, "book a flight", today()).await;
        match extraction {
            Extraction::Failed(reason) => assert!(reason.contains("401")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
