//! Error types for flyme
//!
//! One thiserror enum per concern, folded into [`BotError`] at the host
//! boundary.

use crate::types::SessionId;
use thiserror::Error;

/// Main error type for bot operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BotError {
    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Recognizer (NLU) error
    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    /// Dialog error
    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while querying the language-understanding service
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RecognizerError {
    /// Transport-level failure (DNS, TLS, timeout, ...)
    #[error("Recognizer request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Recognizer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Malformed recognizer response: {0}")]
    MalformedResponse(String),

    /// Recognizer is not configured
    #[error("Recognizer not configured: {0}")]
    NotConfigured(String),
}

/// Errors raised by the date normalizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DateError {
    /// Input contained nothing that looks like a date
    #[error("No date found in {0:?}")]
    Empty(String),

    /// A word that is neither a month nor a filler word
    #[error("Unrecognized token {token:?} in {input:?}")]
    UnknownToken { input: String, token: String },

    /// The same component was given twice, or numbers could not be assigned
    #[error("Conflicting date components in {0:?}")]
    Conflict(String),

    /// Components were read but do not form a calendar date
    #[error("Not a calendar date: {0:?}")]
    OutOfRange(String),

    /// Canonical YYYY-MM-DD form could not be read back
    #[error("Invalid partial date {0:?}, expected YYYY-MM-DD with X placeholders")]
    InvalidFormat(String),
}

/// Errors raised while driving a dialog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DialogError {
    /// A turn was delivered to a dialog that already finished
    #[error("Dialog already completed")]
    AlreadyCompleted,
}

/// Storage-related errors (session store and outcome log)
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// Underlying I/O failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed
    #[error("Storage serialization failed: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Storage deserialization failed: {0}")]
    Deserialization(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Write based on a stale copy of the resource
    #[error("Stale write rejected: {0}")]
    Conflict(String),
}

/// Type alias for flyme Result
pub type Result<T> = std::result::Result<T, BotError>;

/// Type alias for Storage Result
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Type alias for Date Result
pub type DateResult<T> = std::result::Result<T, DateError>;
