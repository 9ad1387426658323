//! # flyme - a conversational flight-booking assistant
//!
//! flyme takes a traveller from "book a flight" to a confirmed request. It asks
//! for origin, destination, budget, departure date and return date, and
//! then asks for confirmation. It records how each booking conversation ended.
//!
//! ## Features
//!
//! - **Entity extraction**: a language-understanding service (LUIS) prefills
//!   whatever the first utterance already says
//! - **Partial dates**: `"september 2022"` becomes `2022-09-XX`; unknown
//!   components stay unknown
//! - **Slot filling**: a waterfall skips questions that are already answered
//!   and keeps asking for a date until it is complete
//! - **Outcome tracking**: accepted and refused bookings go to a JSON log;
//!   the acceptance rate is computed from it
//!
//! ## Quick Start
//!
//! ```no_run
//! use flyme::recognizer::{LuisConfig, LuisRecognizer};
//! use flyme::{Bot, JsonFileOutcomeLog};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let luis = LuisConfig::new(
//!     std::env::var("LuisAppId")?,
//!     std::env::var("LuisAPIKey")?,
//!     "westus.api.cognitive.microsoft.com",
//! );
//!
//! let bot = Bot::builder()
//!     .recognizer(Arc::new(LuisRecognizer::new(luis)?))
//!     .outcome_log(Arc::new(JsonFileOutcomeLog::new("performances.json")))
//!     .build()?;
//!
//! let session_id = bot.create_session().await?;
//! let response = bot
//!     .process_message(session_id, "book a flight from Paris to Rome")
//!     .await?;
//!
//! for message in response.messages {
//!     println!("Bot: {}", message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! user text ──► Bot ──► Recognizer ──► extract ──► BookingRequest draft
//!                │                                        │
//!                │         ┌──────────────────────────────┘
//!                ▼         ▼
//!           SessionStore  BookingDialog ──► DateResolver ──► date::normalize
//!                              │
//!                              ▼
//!                         OutcomeLog ──► report::acceptance_rate
//! ```
//!
//! ## Module Overview
//!
//! - [`bot`]: turn routing, interruptions, builder
//! - [`recognizer`]: NLU trait, LUIS client, draft extraction
//! - [`date`]: partial dates and the normalizer
//! - [`dialog`]: the booking waterfall and its sub-dialogs
//! - [`outcome`]: outcome log backends and reporting
//! - [`session`] / [`storage`]: per-conversation state between turns
//! - [`server`]: axum routes
//! - [`config`]: environment configuration
//! - [`error`]: error types and result aliases

pub mod types;

pub mod error;

pub mod config;

pub mod date;

pub mod booking;

pub mod recognizer;

pub mod dialog;

pub mod outcome;

pub mod context;

pub mod session;

pub mod storage;

pub mod bot;

pub mod server;

pub use booking::BookingRequest;
pub use bot::{Bot, BotBuilder, BotResponse, TurnStatus};
pub use config::BotConfig;
pub use context::{Context, Message, MessageRole};
pub use date::{is_ambiguous, normalize, PartialDate};
pub use dialog::{BookingDialog, DialogContext, DialogStatus, DialogTurn};
pub use error::{BotError, DateError, DialogError, RecognizerError, Result, StorageError};
pub use outcome::{
    acceptance_rate, InMemoryOutcomeLog, JsonFileOutcomeLog, Outcome, OutcomeLog, OutcomeRecords,
    PerformanceReport,
};
pub use recognizer::{Extraction, Recognizer, RecognizerResult};
pub use session::{Conversation, Session};
pub use storage::{memory::InMemorySessionStore, SessionStore};
pub use types::*;
