//! Booking conversation dialogs
//!
//! The booking dialog is a waterfall: a fixed list of steps run top to
//! bottom, one slot per step. A step whose slot is already filled passes
//! straight through; otherwise it asks its question and the dialog suspends
//! until the next user message. The suspended position is plain serde data
//! so the host can persist it between turns.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use flyme::booking::BookingRequest;
//! use flyme::dialog::{BookingDialog, DialogContext, DialogStatus};
//! use flyme::outcome::{InMemoryOutcomeLog, Outcome};
//!
//! # #[tokio::main]
//! # async fn main() -> flyme::Result<()> {
//! let outcomes = InMemoryOutcomeLog::new();
//! let ctx = DialogContext::new(NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(), &outcomes);
//!
//! let draft = BookingRequest::new().with_origin("Paris").with_destination("Rome");
//! let (mut dialog, turn) = BookingDialog::begin(draft);
//! assert_eq!(turn.messages, vec!["What is your budget for this trip?"]);
//!
//! dialog.continue_dialog("$300", &ctx).await?;
//! dialog.continue_dialog("1 july 2022", &ctx).await?;
//! dialog.continue_dialog("8 july 2022", &ctx).await?;
//! let turn = dialog.continue_dialog("yes", &ctx).await?;
//!
//! assert!(matches!(turn.status, DialogStatus::Complete { outcome: Outcome::Accepted, .. }));
//! # Ok(())
//! # }
//! ```

use crate::booking::BookingRequest;
use crate::outcome::{Outcome, OutcomeLog};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod booking;
pub mod confirm;
pub mod date_resolver;

pub use booking::{BookingDialog, BookingState, Slot, Step};
pub use confirm::recognize_confirmation;
pub use date_resolver::{DateField, DateResolution, DateResolver};

/// Collaborators a dialog needs while handling a turn
pub struct DialogContext<'a> {
    /// Reference day for reading dates
    pub today: NaiveDate,
    /// Where finished bookings are recorded
    pub outcomes: &'a dyn OutcomeLog,
}

impl<'a> DialogContext<'a> {
    pub fn new(today: NaiveDate, outcomes: &'a dyn OutcomeLog) -> Self {
        Self { today, outcomes }
    }
}

/// Where a dialog stands after a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DialogStatus {
    /// Suspended until the next user message
    Waiting,
    /// Finished; `booking` is only present when the user accepted
    Complete {
        outcome: Outcome,
        booking: Option<BookingRequest>,
    },
}

/// Messages for the user plus the resulting dialog status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogTurn {
    pub messages: Vec<String>,
    pub status: DialogStatus,
}

impl DialogTurn {
    /// Ask something and wait for the answer
    pub fn waiting(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            status: DialogStatus::Waiting,
        }
    }

    /// Dialog finished
    pub fn complete(outcome: Outcome, booking: Option<BookingRequest>) -> Self {
        Self {
            messages: Vec::new(),
            status: DialogStatus::Complete { outcome, booking },
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == DialogStatus::Waiting
    }
}
