//! Conversation transcript
//!
//! Every user utterance and every bot reply of a session is kept here, in
//! order, up to a bounded length.

use crate::types::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Typed by the traveller
    User,
    /// Sent by the bot
    Bot,
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new bot message
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Bot, content)
    }
}

/// Message history of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub messages: Vec<Message>,
    /// Oldest messages are dropped past this length
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_max_messages() -> usize {
    100
}

impl Context {
    pub fn new() -> Self {
        Self::with_max_messages(default_max_messages())
    }

    pub fn with_max_messages(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
        }
    }

    /// Append a message, trimming the oldest ones past the limit
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);

        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(0..excess);
        }
    }

    /// Append each reply as a bot message
    pub fn add_replies<I, S>(&mut self, replies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for reply in replies {
            self.add_message(Message::bot(reply));
        }
    }

    pub fn messages_by_role(&self, role: MessageRole) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.role == role).collect()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
