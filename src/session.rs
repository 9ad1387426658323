//! Conversation sessions
//!
//! A session owns the transcript and the suspended conversation state of one
//! traveller. It is plain serde data so any [`SessionStore`](crate::storage::SessionStore)
//! can keep it between turns.

use crate::context::Context;
use crate::dialog::BookingDialog;
use crate::types::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the conversation is doing between two turns
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conversation {
    /// Waiting for a new request
    #[default]
    Idle,
    /// A booking waterfall is suspended on a question
    Booking { dialog: BookingDialog },
}

impl Conversation {
    pub fn is_idle(&self) -> bool {
        matches!(self, Conversation::Idle)
    }
}

/// A conversation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub context: Context,
    #[serde(default)]
    pub conversation: Conversation,
    /// Bookings confirmed during this session
    #[serde(default)]
    pub completed_bookings: usize,
    /// Bumped by the store on every write
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            context: Context::new(),
            conversation: Conversation::Idle,
            completed_bookings: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the session's updated_at timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The suspended booking dialog, if one is running
    pub fn booking_dialog(&self) -> Option<&BookingDialog> {
        match &self.conversation {
            Conversation::Booking { dialog } => Some(dialog),
            Conversation::Idle => None,
        }
    }

    pub fn start_booking(&mut self, dialog: BookingDialog) {
        self.conversation = Conversation::Booking { dialog };
        self.touch();
    }

    /// Drop any suspended dialog and go back to idle
    pub fn reset(&mut self) {
        self.conversation = Conversation::Idle;
        self.touch();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingRequest;
    use crate::context::Message;

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert!(session.conversation.is_idle());
        assert!(session.context.messages.is_empty());
        assert!(session.booking_dialog().is_none());
        assert_eq!(session.completed_bookings, 0);
        assert_eq!(session.version, 0);
    }

    #[test]
    fn test_session_touch() {
        let mut session = Session::new();
        let initial_updated_at = session.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));

        session.touch();
        assert!(session.updated_at > initial_updated_at);
    }

    #[test]
    fn test_start_booking_and_reset() {
        let mut session = Session::new();
        let (dialog, _) = BookingDialog::begin(BookingRequest::new());

        session.start_booking(dialog.clone());
        assert_eq!(session.booking_dialog(), Some(&dialog));

        session.reset();
        assert!(session.conversation.is_idle());
    }

    #[test]
    fn test_session_with_dialog_serialization() {
        let mut session = Session::new();
        session.context.add_message(Message::user("book a flight to Rome"));
        let (dialog, _) = BookingDialog::begin(BookingRequest::new().with_destination("Rome"));
        session.start_booking(dialog);

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["conversation"]["kind"], "booking");

        let deserialized: Session = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, session);
    }

    #[test]
    fn test_missing_conversation_defaults_to_idle() {
        let session = Session::new();
        let mut json = serde_json::to_value(&session).unwrap();
        json.as_object_mut().unwrap().remove("conversation");

        let deserialized: Session = serde_json::from_value(json).unwrap();
        assert!(deserialized.conversation.is_idle());
    }
}
