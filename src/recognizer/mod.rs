//! Language-understanding (NLU) abstraction
//!
//! This module provides a trait-based abstraction for the intent/entity
//! recognizer, so the dialog works the same against the LUIS endpoint and
//! against a scripted recognizer in tests.

use crate::error::RecognizerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod extract;
pub mod luis;

pub use extract::{execute_query, extract, Extraction, BOOK_FLIGHT_INTENT};
pub use luis::{LuisConfig, LuisRecognizer};

/// Intents and entities recognized in one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizerResult {
    /// The utterance as sent to the service
    #[serde(default)]
    pub text: String,

    /// Intent label to score
    #[serde(default)]
    pub intents: HashMap<String, f32>,

    /// Slot name to candidate values, best candidate first
    #[serde(default)]
    pub entities: HashMap<String, Vec<String>>,
}

impl RecognizerResult {
    /// Create an empty result for an utterance
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Add an intent score
    pub fn with_intent(mut self, label: impl Into<String>, score: f32) -> Self {
        self.intents.insert(label.into(), score);
        self
    }

    /// Add an entity candidate
    pub fn with_entity(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities
            .entry(slot.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Highest scoring intent with its score
    ///
    /// Ties resolve to the label that sorts first, so the answer does not
    /// depend on map iteration order.
    pub fn top_intent(&self) -> Option<(&str, f32)> {
        self.intents
            .iter()
            .max_by(|(la, sa), (lb, sb)| sa.total_cmp(sb).then_with(|| lb.cmp(la)))
            .map(|(label, score)| (label.as_str(), *score))
    }

    /// First non-empty candidate for a slot
    pub fn first_entity(&self, slot: &str) -> Option<&str> {
        self.entities
            .get(slot)
            .and_then(|values| values.first())
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Trait for intent/entity recognizers
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize intents and entities in an utterance
    async fn recognize(&self, utterance: &str) -> Result<RecognizerResult, RecognizerError>;

    /// Name of the recognizer, for logs
    fn name(&self) -> &str;

    /// Whether the recognizer has what it needs to make calls
    fn is_configured(&self) -> bool {
        true
    }
}
