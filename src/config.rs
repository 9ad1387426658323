//! Runtime configuration
//!
//! Settings come from environment variables, usually loaded from a `.env`
//! file by the binary. Command-line flags override the port and log path.

use crate::error::{BotError, Result};
use crate::recognizer::LuisConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3978;
pub const DEFAULT_LUIS_HOST: &str = "australiaeast.api.cognitive.microsoft.com";
pub const DEFAULT_OUTCOME_LOG: &str = "performances.json";
pub const DEFAULT_LUIS_TIMEOUT_SECS: u64 = 10;

/// Bot settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// HTTP port for `flyme serve`
    pub port: u16,
    pub luis: LuisConfig,
    /// JSON file holding the outcome log
    pub outcome_log_path: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            luis: LuisConfig::new("", "", DEFAULT_LUIS_HOST)
                .with_timeout(Duration::from_secs(DEFAULT_LUIS_TIMEOUT_SECS)),
            outcome_log_path: PathBuf::from(DEFAULT_OUTCOME_LOG),
        }
    }
}

impl BotConfig {
    /// Read settings from the process environment
    ///
    /// | Variable            | Default                                      |
    /// |---------------------|----------------------------------------------|
    /// | `PORT`              | `3978`                                       |
    /// | `LuisAppId`         | empty                                        |
    /// | `LuisAPIKey`        | empty                                        |
    /// | `LuisAPIHostName`   | `australiaeast.api.cognitive.microsoft.com`  |
    /// | `OUTCOME_LOG_PATH`  | `performances.json`                          |
    /// | `LUIS_TIMEOUT_SECS` | `10`                                         |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|e| {
                BotError::Configuration(format!("PORT must be a port number, got {:?}: {}", value, e))
            })?,
            None => defaults.port,
        };

        let timeout = match get("LUIS_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().map_err(|e| {
                    BotError::Configuration(format!(
                        "LUIS_TIMEOUT_SECS must be a number of seconds, got {:?}: {}",
                        value, e
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.luis.timeout,
        };

        let luis = LuisConfig::new(
            get("LuisAppId").unwrap_or_default(),
            get("LuisAPIKey").unwrap_or_default(),
            get("LuisAPIHostName").unwrap_or(defaults.luis.host_name),
        )
        .with_timeout(timeout);

        let outcome_log_path = get("OUTCOME_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.outcome_log_path);

        Ok(Self {
            port,
            luis,
            outcome_log_path,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_outcome_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.outcome_log_path = path.into();
        self
    }
}
