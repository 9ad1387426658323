// Bot core implementation
//
// The Bot owns the collaborators of a conversation turn (recognizer, outcome
// log, session store) and routes each message either to the suspended
// booking dialog or to the recognizer. Turns of one session never overlap.

use crate::booking::BookingRequest;
use crate::context::Message;
use crate::dialog::{BookingDialog, DialogContext, DialogStatus, DialogTurn};
use crate::error::{BotError, Result, StorageError};
use crate::outcome::{InMemoryOutcomeLog, Outcome, OutcomeLog, PerformanceReport};
use crate::recognizer::{execute_query, Extraction, Recognizer};
use crate::session::{Conversation, Session};
use crate::storage::memory::InMemorySessionStore;
use crate::storage::SessionStore;
use crate::types::SessionId;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// First message of every conversation
pub const GREETING: &str = "What can I help you with today?";

/// Sent after a booking dialog ends
pub const FOLLOW_UP: &str = "What else can I do for you?";

const CANCELLED: &str = "Cancelling";

const HELP: &str = "I can book flights. Tell me where you are flying from and to, \
                    your budget and your travel dates, for example \
                    \"book a flight from Paris to Rome on 12 august 2022\". \
                    Say \"cancel\" at any time to start over.";

/// Where the conversation stands after a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// A question is pending
    Waiting,
    /// A booking dialog just finished
    Complete,
    /// The user cancelled the booking dialog
    Cancelled,
    /// No dialog is running
    Idle,
}

/// Reply to one user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotResponse {
    pub messages: Vec<String>,
    pub status: TurnStatus,
    /// The confirmed booking, on the turn the user accepted it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingRequest>,
}

impl BotResponse {
    fn new(messages: Vec<String>, status: TurnStatus) -> Self {
        Self {
            messages,
            status,
            booking: None,
        }
    }
}

/// Messages that bypass the active dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interruption {
    Cancel,
    Help,
}

fn interruption(text: &str) -> Option<Interruption> {
    match text.trim().to_lowercase().as_str() {
        "cancel" | "quit" => Some(Interruption::Cancel),
        "help" | "?" => Some(Interruption::Help),
        _ => None,
    }
}

/// Message sent once a booking has been accepted
pub fn booked_message(booking: &BookingRequest) -> String {
    let show = |value: Option<String>| value.unwrap_or_default();
    format!(
        "I have you booked to {} from {} on {}",
        show(booking.destination_city.clone()),
        show(booking.origin_city.clone()),
        show(booking.departure_date.map(|d| d.to_string())),
    )
}

/// Flight-booking bot
///
/// Each call to [`Bot::process_message`] runs one turn: the session is loaded
/// from the store, the message is handled, the session is written back.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use flyme::error::RecognizerError;
/// use flyme::recognizer::{Recognizer, RecognizerResult};
/// use flyme::{Bot, TurnStatus};
/// use std::sync::Arc;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl Recognizer for Fixed {
///     async fn recognize(&self, utterance: &str) -> Result<RecognizerResult, RecognizerError> {
///         Ok(RecognizerResult::new(utterance)
///             .with_intent("book", 0.9)
///             .with_entity("dst_city", "rome"))
///     }
///     fn name(&self) -> &str {
///         "fixed"
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> flyme::Result<()> {
/// let bot = Bot::builder().recognizer(Arc::new(Fixed)).build()?;
///
/// let session_id = bot.create_session().await?;
/// let response = bot.process_message(session_id, "book a flight to rome").await?;
///
/// assert_eq!(response.status, TurnStatus::Waiting);
/// assert_eq!(response.messages, vec!["From what city will you be travelling?"]);
/// # Ok(())
/// # }
/// ```
pub struct Bot {
    recognizer: Arc<dyn Recognizer>,
    outcomes: Arc<dyn OutcomeLog>,
    session_store: Arc<dyn SessionStore>,
    reference_date: Option<NaiveDate>,
    max_context_messages: usize,
    turn_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::new()
    }

    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    /// Day used to read relative and partial dates
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn outcomes(&self) -> &Arc<dyn OutcomeLog> {
        &self.outcomes
    }

    /// Create a new conversation; the greeting is its first message
    pub async fn create_session(&self) -> Result<SessionId> {
        let mut session = Session::new();
        session.context.max_messages = self.max_context_messages;
        session.context.add_message(Message::bot(GREETING));
        let session_id = session.id;

        self.session_store.create(session).await?;
        info!(session_id = %session_id, "Created session");

        Ok(session_id)
    }

    pub async fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>> {
        Ok(self.session_store.get(session_id).await?)
    }

    /// Forget a conversation; an unfinished booking is not recorded
    pub async fn end_session(&self, session_id: &SessionId) -> Result<()> {
        self.session_store
            .delete(session_id)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => BotError::SessionNotFound(*session_id),
                other => other.into(),
            })?;
        self.turn_locks.lock().await.remove(session_id);
        info!(session_id = %session_id, "Ended session");
        Ok(())
    }

    /// Lock held for the whole of one turn of `session_id`
    async fn turn_lock(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        self.turn_locks
            .lock()
            .await
            .entry(session_id)
            .or_default()
            .clone()
    }

    /// Handle one user message
    ///
    /// Messages for the same session are handled one after the other, in the
    /// order they acquire the session's turn lock.
    pub async fn process_message(
        &self,
        session_id: SessionId,
        text: impl AsRef<str>,
    ) -> Result<BotResponse> {
        let text = text.as_ref();
        info!(
            session_id = %session_id,
            message_length = text.len(),
            "Processing user message"
        );

        let lock = self.turn_lock(session_id).await;
        let _turn = lock.lock().await;
        trace!(session_id = %session_id, "Acquired turn lock");

        let mut session = match self.session_store.get(&session_id).await? {
            Some(session) => session,
            None => {
                self.turn_locks.lock().await.remove(&session_id);
                return Err(BotError::SessionNotFound(session_id));
            }
        };

        debug!(
            idle = session.conversation.is_idle(),
            message_count = session.context.messages.len(),
            "Session retrieved"
        );

        session.context.add_message(Message::user(text));

        let response = self.run_turn(&mut session, text).await?;

        session.context.add_replies(response.messages.iter().cloned());
        session.touch();
        self.session_store.update(&session_id, session).await?;

        debug!(status = ?response.status, replies = response.messages.len(), "Turn finished");
        Ok(response)
    }

    async fn run_turn(&self, session: &mut Session, text: &str) -> Result<BotResponse> {
        if let Some(interruption) = interruption(text) {
            return Ok(self.interrupt(session, interruption));
        }

        let ctx = DialogContext::new(self.today(), self.outcomes.as_ref());

        match &mut session.conversation {
            Conversation::Booking { dialog } => {
                let turn = dialog.continue_dialog(text, &ctx).await?;
                Ok(self.after_dialog_turn(session, turn))
            }
            Conversation::Idle => match execute_query(self.recognizer.as_ref(), text, ctx.today).await {
                Extraction::Booking(draft) => Ok(self.start_booking(session, draft)),
                Extraction::Failed(reason) => {
                    debug!(reason = %reason, "Falling back to an empty booking draft");
                    Ok(self.start_booking(session, BookingRequest::new()))
                }
                Extraction::NoIntent(intent) => {
                    let intent = intent.unwrap_or_else(|| "none".to_string());
                    Ok(BotResponse::new(
                        vec![format!(
                            "Sorry, I didn't get that. Please try asking in a different way (intent was {})",
                            intent
                        )],
                        TurnStatus::Idle,
                    ))
                }
            },
        }
    }

    fn interrupt(&self, session: &mut Session, interruption: Interruption) -> BotResponse {
        match interruption {
            Interruption::Help => {
                let status = if session.conversation.is_idle() {
                    TurnStatus::Idle
                } else {
                    TurnStatus::Waiting
                };
                BotResponse::new(vec![HELP.to_string()], status)
            }
            Interruption::Cancel => {
                if let Some(dialog) = session.booking_dialog() {
                    info!(session_id = %session.id, draft = %dialog.request(), "Booking cancelled");
                }
                session.reset();
                BotResponse::new(vec![CANCELLED.to_string()], TurnStatus::Cancelled)
            }
        }
    }

    fn start_booking(&self, session: &mut Session, draft: BookingRequest) -> BotResponse {
        let (dialog, turn) = BookingDialog::begin(draft);
        session.start_booking(dialog);
        self.after_dialog_turn(session, turn)
    }

    fn after_dialog_turn(&self, session: &mut Session, turn: DialogTurn) -> BotResponse {
        match turn.status {
            DialogStatus::Waiting => BotResponse::new(turn.messages, TurnStatus::Waiting),
            DialogStatus::Complete { outcome, booking } => {
                session.reset();

                let mut messages = turn.messages;
                if let (Outcome::Accepted, Some(booking)) = (outcome, &booking) {
                    session.completed_bookings += 1;
                    messages.push(booked_message(booking));
                } else {
                    warn!(session_id = %session.id, "Booking dialog ended without a booking");
                }
                messages.push(FOLLOW_UP.to_string());

                BotResponse {
                    messages,
                    status: TurnStatus::Complete,
                    booking,
                }
            }
        }
    }

    /// Counts and acceptance rate over the outcome log
    pub async fn performance(&self) -> Result<PerformanceReport> {
        let records = self.outcomes.load().await?;
        Ok(PerformanceReport::from(&records))
    }
}

/// Builder for [`Bot`]
pub struct BotBuilder {
    recognizer: Option<Arc<dyn Recognizer>>,
    outcomes: Option<Arc<dyn OutcomeLog>>,
    session_store: Option<Arc<dyn SessionStore>>,
    reference_date: Option<NaiveDate>,
    max_context_messages: usize,
}

impl BotBuilder {
    pub fn new() -> Self {
        Self {
            recognizer: None,
            outcomes: None,
            session_store: None,
            reference_date: None,
            max_context_messages: 100,
        }
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn outcome_log(mut self, outcomes: Arc<dyn OutcomeLog>) -> Self {
        self.outcomes = Some(outcomes);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Pin the day dates are read against instead of using the clock
    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn max_context_messages(mut self, max: usize) -> Self {
        self.max_context_messages = max;
        self
    }

    pub fn build(self) -> Result<Bot> {
        let recognizer = self
            .recognizer
            .ok_or_else(|| BotError::Configuration("A recognizer is required".to_string()))?;

        if self.max_context_messages == 0 {
            return Err(BotError::Configuration(
                "max_context_messages must be greater than zero".to_string(),
            ));
        }

        if !recognizer.is_configured() {
            warn!(
                recognizer = recognizer.name(),
                "Recognizer is not configured; every booking will ask all questions"
            );
        }

        Ok(Bot {
            recognizer,
            outcomes: self
                .outcomes
                .unwrap_or_else(|| Arc::new(InMemoryOutcomeLog::new())),
            session_store: self
                .session_store
                .unwrap_or_else(|| Arc::new(InMemorySessionStore::new())),
            reference_date: self.reference_date,
            max_context_messages: self.max_context_messages,
            turn_locks: Mutex::new(HashMap::new()),
        })
    }
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognizerError;
    use crate::recognizer::RecognizerResult;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl Recognizer for Unreachable {
        async fn recognize(&self, _utterance: &str) -> std::result::Result<RecognizerResult, RecognizerError> {
            Err(RecognizerError::NotConfigured("no endpoint".to_string()))
        }

        fn name(&self) -> &str {
            "unreachable"
        }

        fn is_configured(&self) -> bool {
            false
        }
    }

    fn bot() -> Bot {
        Bot::builder()
            .recognizer(Arc::new(Unreachable))
            .reference_date(NaiveDate::from_ymd_opt(2022, 6, 1).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_recognizer() {
        let result = Bot::builder().build();
        assert!(matches!(result, Err(BotError::Configuration(_))));
    }

    #[test]
    fn test_builder_rejects_empty_context() {
        let result = Bot::builder()
            .recognizer(Arc::new(Unreachable))
            .max_context_messages(0)
            .build();
        assert!(matches!(result, Err(BotError::Configuration(_))));
    }

    #[test]
    fn test_interruptions() {
        assert_eq!(interruption(" Cancel "), Some(Interruption::Cancel));
        assert_eq!(interruption("QUIT"), Some(Interruption::Cancel));
        assert_eq!(interruption("?"), Some(Interruption::Help));
        assert_eq!(interruption("cancel my flight"), None);
    }

    #[test]
    fn test_booked_message() {
        let booking = BookingRequest::new()
            .with_origin("Paris")
            .with_destination("Marseille")
            .with_departure("2022-10-10".parse().unwrap());
        assert_eq!(
            booked_message(&booking),
            "I have you booked to Marseille from Paris on 2022-10-10"
        );
    }

    #[tokio::test]
    async fn test_session_starts_with_greeting() {
        let bot = bot();
        let session_id = bot.create_session().await.unwrap();
        let session = bot.get_session(&session_id).await.unwrap().unwrap();

        assert_eq!(session.context.messages.len(), 1);
        assert_eq!(session.context.messages[0].content, GREETING);
        assert_eq!(bot.greeting(), GREETING);
    }

    #[tokio::test]
    async fn test_recognizer_failure_asks_every_slot() {
        let bot = bot();
        let session_id = bot.create_session().await.unwrap();

        let response = bot.process_message(session_id, "book a flight").await.unwrap();
        assert_eq!(response.status, TurnStatus::Waiting);
        assert_eq!(response.messages, vec!["From what city will you be travelling?"]);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let bot = bot();
        let result = bot.process_message(SessionId::new(), "hello").await;
        assert!(matches!(result, Err(BotError::SessionNotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_session_turns_run_one_after_the_other() {
        let bot = bot();
        let session_id = bot.create_session().await.unwrap();

        let (first, second) = tokio::join!(
            bot.process_message(session_id, "book a flight"),
            bot.process_message(session_id, "help"),
        );
        assert!(first.is_ok());
        assert!(second.is_ok());

        let session = bot.get_session(&session_id).await.unwrap().unwrap();
        assert_eq!(session.version, 2);
        // greeting plus two user messages and two replies
        assert_eq!(session.context.messages.len(), 5);
    }

    #[tokio::test]
    async fn test_end_session() {
        let bot = bot();
        let session_id = bot.create_session().await.unwrap();

        bot.end_session(&session_id).await.unwrap();
        assert!(bot.get_session(&session_id).await.unwrap().is_none());
        assert!(matches!(
            bot.end_session(&session_id).await,
            Err(BotError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_help_keeps_dialog_state() {
        let bot = bot();
        let session_id = bot.create_session().await.unwrap();
        bot.process_message(session_id, "book a flight").await.unwrap();

        let response = bot.process_message(session_id, "help").await.unwrap();
        assert_eq!(response.status, TurnStatus::Waiting);
        assert!(response.messages[0].starts_with("I can book flights"));

        let session = bot.get_session(&session_id).await.unwrap().unwrap();
        assert!(session.booking_dialog().is_some());
    }

    #[tokio::test]
    async fn test_performance_on_empty_log() {
        let report = bot().performance().await.unwrap();
        assert_eq!(report.successful, 0);
        assert_eq!(report.acceptance_rate, None);
    }
}
