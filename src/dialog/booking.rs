//! The flight-booking waterfall
//!
//! Steps run in a fixed order:
//!
//! ```text
//! Origin -> Destination -> Budget -> DepartureDate -> ReturnDate -> Confirm -> Final
//! ```
//!
//! Date steps hand over to a [`DateResolver`] whenever the date is missing or
//! ambiguous. Confirm is the only branch: yes records the booking as accepted,
//! no records it as abandoned.

use crate::booking::BookingRequest;
use crate::date::is_ambiguous;
use crate::dialog::confirm::recognize_confirmation;
use crate::dialog::date_resolver::{DateField, DateResolution, DateResolver};
use crate::dialog::{DialogContext, DialogTurn};
use crate::error::{DialogError, Result};
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Free-text slots collected with a plain question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Origin,
    Destination,
    Budget,
}

impl Slot {
    pub fn prompt(&self) -> &'static str {
        match self {
            Slot::Origin => "From what city will you be travelling?",
            Slot::Destination => "To what city would you like to travel?",
            Slot::Budget => "What is your budget for this trip?",
        }
    }

    fn step(&self) -> Step {
        match self {
            Slot::Origin => Step::Origin,
            Slot::Destination => Step::Destination,
            Slot::Budget => Step::Budget,
        }
    }

    fn value<'a>(&self, request: &'a BookingRequest) -> Option<&'a String> {
        match self {
            Slot::Origin => request.origin_city.as_ref(),
            Slot::Destination => request.destination_city.as_ref(),
            Slot::Budget => request.budget.as_ref(),
        }
    }

    fn set(&self, request: &mut BookingRequest, value: String) {
        match self {
            Slot::Origin => request.origin_city = Some(value),
            Slot::Destination => request.destination_city = Some(value),
            Slot::Budget => request.budget = Some(value),
        }
    }
}

/// Waterfall steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Origin,
    Destination,
    Budget,
    DepartureDate,
    ReturnDate,
    Confirm,
    Final,
}

impl Step {
    /// Step that follows this one; `Final` is terminal
    pub fn next(&self) -> Step {
        match self {
            Step::Origin => Step::Destination,
            Step::Destination => Step::Budget,
            Step::Budget => Step::DepartureDate,
            Step::DepartureDate => Step::ReturnDate,
            Step::ReturnDate => Step::Confirm,
            Step::Confirm | Step::Final => Step::Final,
        }
    }
}

/// Where a suspended booking dialog is waiting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BookingState {
    /// Asked for a free-text slot
    AwaitingSlot { slot: Slot },
    /// Inside a date sub-dialog
    ResolvingDate { resolver: DateResolver },
    /// Showed the summary, waiting for yes/no
    AwaitingConfirmation,
    /// Reached the final step
    Finished { outcome: Outcome },
}

impl BookingState {
    /// Step this state belongs to
    pub fn step(&self) -> Step {
        match self {
            BookingState::AwaitingSlot { slot } => slot.step(),
            BookingState::ResolvingDate { resolver } => match resolver.field() {
                DateField::Departure => Step::DepartureDate,
                DateField::Return => Step::ReturnDate,
            },
            BookingState::AwaitingConfirmation => Step::Confirm,
            BookingState::Finished { .. } => Step::Final,
        }
    }
}

/// Booking waterfall for one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDialog {
    request: BookingRequest,
    state: BookingState,
}

impl BookingDialog {
    /// Start the waterfall from a (possibly prefilled) draft
    ///
    /// Runs every step whose slot is already filled and stops at the first
    /// question.
    pub fn begin(request: BookingRequest) -> (Self, DialogTurn) {
        info!(draft = %request, "Starting booking dialog");

        let mut dialog = Self {
            request,
            state: BookingState::AwaitingConfirmation,
        };
        let turn = dialog.advance(Step::Origin);
        (dialog, turn)
    }

    /// The draft as filled so far
    pub fn request(&self) -> &BookingRequest {
        &self.request
    }

    /// Current suspended state
    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, BookingState::Finished { .. })
    }

    /// Resume the waterfall with the user's answer
    pub async fn continue_dialog(
        &mut self,
        utterance: &str,
        ctx: &DialogContext<'_>,
    ) -> Result<DialogTurn> {
        match &mut self.state {
            BookingState::AwaitingSlot { slot } => {
                let slot = *slot;
                slot.set(&mut self.request, utterance.to_string());
                self.request.record_turn(utterance);
                Ok(self.advance(slot.step().next()))
            }

            BookingState::ResolvingDate { resolver } => {
                let field = resolver.field();
                match resolver.resolve(utterance, ctx.today) {
                    DateResolution::Resolved(date) => {
                        match field {
                            DateField::Departure => self.request.departure_date = Some(date),
                            DateField::Return => self.request.return_date = Some(date),
                        }
                        self.request.record_turn(date.to_string());
                        let step = self.state.step();
                        Ok(self.advance(step.next()))
                    }
                    DateResolution::Reprompt(message) => Ok(DialogTurn::waiting(message)),
                }
            }

            BookingState::AwaitingConfirmation => match recognize_confirmation(utterance) {
                Some(confirmed) => {
                    let outcome = if confirmed {
                        Outcome::Accepted
                    } else {
                        Outcome::Abandoned
                    };
                    self.finish(outcome, ctx).await
                }
                None => {
                    debug!(answer = %utterance, "Confirmation answer not understood");
                    Ok(DialogTurn::waiting(format!(
                        "Please answer yes or no.\n{}",
                        self.summary()
                    )))
                }
            },

            BookingState::Finished { .. } => Err(DialogError::AlreadyCompleted.into()),
        }
    }

    /// Run steps from `step` until one needs the user
    fn advance(&mut self, mut step: Step) -> DialogTurn {
        loop {
            match step {
                Step::Origin | Step::Destination | Step::Budget => {
                    let slot = match step {
                        Step::Origin => Slot::Origin,
                        Step::Destination => Slot::Destination,
                        _ => Slot::Budget,
                    };
                    if let Some(value) = slot.value(&self.request).cloned() {
                        self.request.record_turn(value);
                    } else {
                        self.request.record_turn(slot.prompt());
                        self.state = BookingState::AwaitingSlot { slot };
                        return DialogTurn::waiting(slot.prompt());
                    }
                }

                Step::DepartureDate | Step::ReturnDate => {
                    let field = if step == Step::DepartureDate {
                        DateField::Departure
                    } else {
                        DateField::Return
                    };
                    let existing = match field {
                        DateField::Departure => self.request.departure_date,
                        DateField::Return => self.request.return_date,
                    };
                    match existing {
                        Some(date) if !is_ambiguous(&date) => {
                            self.request.record_turn(date.to_string());
                        }
                        _ => {
                            let (resolver, prompt) = DateResolver::begin(field, existing.as_ref());
                            self.request.record_turn(prompt.clone());
                            self.state = BookingState::ResolvingDate { resolver };
                            return DialogTurn::waiting(prompt);
                        }
                    }
                }

                Step::Confirm => {
                    // The transcript stops at the last slot answer.
                    let summary = self.summary();
                    self.state = BookingState::AwaitingConfirmation;
                    return DialogTurn::waiting(summary);
                }

                Step::Final => {
                    // Only the confirmation answer leads to Final.
                    warn!("Booking waterfall advanced past confirmation");
                    self.state = BookingState::AwaitingConfirmation;
                    return DialogTurn::waiting(self.summary());
                }
            }
            step = step.next();
        }
    }

    async fn finish(&mut self, outcome: Outcome, ctx: &DialogContext<'_>) -> Result<DialogTurn> {
        ctx.outcomes.append(outcome, self.request.clone()).await?;
        self.state = BookingState::Finished { outcome };

        match outcome {
            Outcome::Accepted => {
                info!(booking = %self.request, "Booking accepted");
                Ok(DialogTurn::complete(outcome, Some(self.request.clone())))
            }
            Outcome::Abandoned => {
                warn!(booking = %self.request, "Booking refused");
                Ok(DialogTurn::complete(outcome, None))
            }
        }
    }

    /// Confirmation message listing the collected slots
    pub fn summary(&self) -> String {
        fn show<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(T::to_string).unwrap_or_default()
        }

        format!(
            "Please confirm your travel details:\n\
             - From: {}\n\
             - To: {}\n\
             - Departure date: {}\n\
             - Return date: {}\n\
             - Price: {}\n\
             (1) Yes or (2) No",
            show(&self.request.origin_city),
            show(&self.request.destination_city),
            show(&self.request.departure_date),
            show(&self.request.return_date),
            show(&self.request.budget),
        )
    }
}
