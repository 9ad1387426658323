//! LUIS recognizer
//!
//! This module implements the Recognizer trait against the LUIS v2 REST
//! prediction endpoint.

use crate::error::RecognizerError;
use crate::recognizer::{Recognizer, RecognizerResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Connection settings for a LUIS application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuisConfig {
    /// LUIS application id
    pub app_id: String,
    /// Subscription key
    pub api_key: String,
    /// Endpoint host, e.g. `westus.api.cognitive.microsoft.com`
    pub host_name: String,
    /// Request timeout
    pub timeout: Duration,
}

impl LuisConfig {
    /// Create a config with the default 10s timeout
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        host_name: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            host_name: host_name.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Prediction endpoint for the application
    pub fn endpoint(&self) -> String {
        let host = self
            .host_name
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!("https://{}/luis/v2.0/apps/{}", host, self.app_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LuisResponse {
    #[serde(default)]
    query: String,
    top_scoring_intent: Option<LuisIntent>,
    #[serde(default)]
    intents: Vec<LuisIntent>,
    #[serde(default)]
    entities: Vec<LuisEntity>,
}

#[derive(Debug, Deserialize)]
struct LuisIntent {
    intent: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct LuisEntity {
    entity: String,
    #[serde(rename = "type")]
    entity_type: String,
}

impl From<LuisResponse> for RecognizerResult {
    fn from(response: LuisResponse) -> Self {
        let mut result = RecognizerResult::new(response.query);

        for intent in response.intents {
            result.intents.insert(intent.intent, intent.score);
        }
        // Non-verbose answers only carry the top intent.
        if let Some(top) = response.top_scoring_intent {
            result.intents.entry(top.intent).or_insert(top.score);
        }

        // Entities arrive in utterance order, which keeps the first candidate first.
        for entity in response.entities {
            result
                .entities
                .entry(entity.entity_type)
                .or_default()
                .push(entity.entity);
        }

        result
    }
}

/// Parse a raw LUIS v2 response body
pub fn parse_response(body: &str) -> Result<RecognizerResult, RecognizerError> {
    let response: LuisResponse = serde_json::from_str(body)
        .map_err(|e| RecognizerError::MalformedResponse(e.to_string()))?;
    Ok(response.into())
}

/// LUIS recognizer
pub struct LuisRecognizer {
    client: reqwest::Client,
    config: LuisConfig,
}

impl LuisRecognizer {
    /// Create a new LUIS recognizer
    pub fn new(config: LuisConfig) -> Result<Self, RecognizerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        info!(endpoint = %config.endpoint(), "Created LUIS recognizer");

        Ok(Self { client, config })
    }

    /// Connection settings
    pub fn config(&self) -> &LuisConfig {
        &self.config
    }
}

#[async_trait]
impl Recognizer for LuisRecognizer {
    async fn recognize(&self, utterance: &str) -> Result<RecognizerResult, RecognizerError> {
        if !self.is_configured() {
            return Err(RecognizerError::NotConfigured(
                "LuisAppId and LuisAPIKey must be set".to_string(),
            ));
        }

        debug!(utterance_length = utterance.len(), "Querying LUIS");

        let response = self
            .client
            .get(self.config.endpoint())
            .query(&[
                ("verbose", "true"),
                ("subscription-key", self.config.api_key.as_str()),
                ("q", utterance),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "LUIS returned an error status");
            return Err(RecognizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        trace!(body = %body, "LUIS response");
        parse_response(&body)
    }

    fn name(&self) -> &str {
        "LUIS"
    }

    fn is_configured(&self) -> bool {
        !self.config.app_id.is_empty() && !self.config.api_key.is_empty()
    }
}
