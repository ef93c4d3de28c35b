//! Dialogue controller: the report-collection state machine.
//!
//! [`DialogueController::step`] is a pure function of the user's current
//! session and one normalized input. It returns the transition to apply to
//! the session store and the replies to send. It never touches the store or
//! the transport itself, which keeps every rule below testable without I/O.
//!
//! ```text
//! Idle --"דווח"--> AwaitingLocation --location--> AwaitingAmount
//! AwaitingAmount --bucket--> AwaitingSpecies{bucket}
//! AwaitingAmount --exact--> AwaitingAmountExact --number--> AwaitingSpecies
//! AwaitingSpecies --species|unknown--> AwaitingHeight
//! AwaitingHeight --bucket--> Complete
//! AwaitingHeight --exact--> AwaitingHeightExact --number--> Complete
//! ```
//!
//! A location share restarts the conversation from any state. Cancel in an
//! exact state goes back to the menu it came from.

use super::draft::{Amount, AmountBucket, BirdType, CompletedDraft, Draft, Height};
use super::input::Input;
use super::payload::Payload;
use super::prompts::{PromptRenderer, Reply};
use super::state::{DialogueState, ExactField, Session};

/// What to do with the user's session after an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Leave the session (or its absence) as it is.
    Unchanged,
    /// Replace whatever session exists with a new one.
    Start(Session),
    /// Move the existing session forward.
    Update(Session),
    /// Drop the session without a report.
    End,
    /// Drop the session and finalize the report.
    Complete(CompletedDraft),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub transition: Transition,
    pub replies: Vec<Reply>,
}

impl Step {
    fn unchanged(replies: Vec<Reply>) -> Self {
        Self {
            transition: Transition::Unchanged,
            replies,
        }
    }
}

/// Words that start a report or back out of an exact-value question.
#[derive(Debug, Clone)]
pub struct Keywords {
    pub trigger: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            trigger: vec!["דווח".to_string(), "report".to_string()],
            cancel: vec!["בטל".to_string(), "cancel".to_string()],
        }
    }
}

pub struct DialogueController {
    trigger: Vec<String>,
    cancel: Vec<String>,
    renderer: PromptRenderer,
}

impl DialogueController {
    pub fn new(keywords: Keywords, renderer: PromptRenderer) -> Self {
        let normalize = |words: Vec<String>| {
            words
                .iter()
                .map(|w| normalize_keyword(w))
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            trigger: normalize(keywords.trigger),
            cancel: normalize(keywords.cancel),
            renderer,
        }
    }

    pub fn renderer(&self) -> &PromptRenderer {
        &self.renderer
    }

    pub fn step(&self, user_id: &str, current: Option<&Session>, input: &Input) -> Step {
        match input {
            Input::Unrecognized(reason) => {
                tracing::debug!("Unrecognized input from {}: {}", user_id, reason);
                Step::unchanged(Vec::new())
            }
            Input::Location { lat, lng } => {
                if let Some(session) = current {
                    tracing::debug!(
                        "Location from {} restarts report in {}",
                        user_id,
                        session.state.name()
                    );
                }
                let session = Session::new(
                    DialogueState::AwaitingAmount,
                    Draft::at_location(user_id, *lat, *lng),
                );
                self.start(session)
            }
            Input::FreeText(text) => match current {
                None if self.is_trigger(text) => self.start(Session::new(
                    DialogueState::AwaitingLocation,
                    Draft::new(user_id),
                )),
                None => Step::unchanged(self.renderer.help()),
                Some(session) => self.on_text(session, text),
            },
            Input::QuickReply(payload) | Input::Postback(payload) => match (current, payload) {
                (_, Payload::Unknown(raw)) => {
                    tracing::warn!("Unknown payload from {}: {}", user_id, raw);
                    Step::unchanged(self.renderer.unknown_payload(raw))
                }
                (None, _) => Step::unchanged(self.renderer.help()),
                (Some(session), payload) => self.on_payload(session, payload),
            },
        }
    }

    fn on_text(&self, session: &Session, text: &str) -> Step {
        let Some(field) = session.pending_free_text_field() else {
            // Menus must be answered with their buttons.
            return Step::unchanged(self.renderer.question(session));
        };

        if self.is_cancel(text) {
            let back = match field {
                ExactField::Amount => DialogueState::AwaitingAmount,
                ExactField::Height => DialogueState::AwaitingHeight,
            };
            return self.update(session.with_state(back));
        }

        let Some(number) = parse_number(text) else {
            return Step::unchanged(self.renderer.not_a_number());
        };

        let mut draft = session.draft.clone();
        match field {
            ExactField::Amount => {
                draft.amount = Some(Amount::Exact(number));
                let menu = AmountBucket::for_count(number);
                self.update(Session::new(DialogueState::AwaitingSpecies { menu }, draft))
            }
            ExactField::Height => {
                draft.height = Some(Height::Exact(number));
                self.complete(draft)
            }
        }
    }

    fn on_payload(&self, session: &Session, payload: &Payload) -> Step {
        let mut draft = session.draft.clone();
        match (session.state, payload) {
            (_, Payload::CancelReport) => Step {
                transition: Transition::End,
                replies: self.renderer.cancelled(),
            },
            (DialogueState::AwaitingAmount, Payload::Amount(bucket)) => {
                draft.amount = Some(Amount::Bucket(*bucket));
                self.update(Session::new(
                    DialogueState::AwaitingSpecies { menu: *bucket },
                    draft,
                ))
            }
            (DialogueState::AwaitingAmount, Payload::AmountExact) => {
                self.update(session.with_state(DialogueState::AwaitingAmountExact))
            }
            (DialogueState::AwaitingSpecies { menu }, Payload::Species(chosen))
                if chosen.accepted_in(menu) =>
            {
                draft.bird_type = Some(BirdType::Known(*chosen));
                self.update(Session::new(DialogueState::AwaitingHeight, draft))
            }
            (DialogueState::AwaitingSpecies { .. }, Payload::SpeciesUnknown) => {
                draft.bird_type = Some(BirdType::Unknown);
                self.update(Session::new(DialogueState::AwaitingHeight, draft))
            }
            (DialogueState::AwaitingHeight, Payload::Height(bucket)) => {
                draft.height = Some(Height::Bucket(*bucket));
                self.complete(draft)
            }
            (DialogueState::AwaitingHeight, Payload::HeightExact) => {
                self.update(session.with_state(DialogueState::AwaitingHeightExact))
            }
            (state, payload) => {
                tracing::debug!("Stale button {} in {}", payload, state.name());
                Step::unchanged(self.renderer.question(session))
            }
        }
    }

    fn start(&self, session: Session) -> Step {
        let replies = self.renderer.question(&session);
        Step {
            transition: Transition::Start(session),
            replies,
        }
    }

    fn update(&self, session: Session) -> Step {
        let replies = self.renderer.question(&session);
        Step {
            transition: Transition::Update(session),
            replies,
        }
    }

    fn complete(&self, draft: Draft) -> Step {
        match draft.complete() {
            Ok(completed) => Step {
                transition: Transition::Complete(completed),
                replies: Vec::new(),
            },
            Err(e) => {
                tracing::error!("Dropping broken report: {}", e);
                Step {
                    transition: Transition::End,
                    replies: self.renderer.something_went_wrong(),
                }
            }
        }
    }

    fn is_trigger(&self, text: &str) -> bool {
        self.trigger.contains(&normalize_keyword(text))
    }

    fn is_cancel(&self, text: &str) -> bool {
        self.cancel.contains(&normalize_keyword(text))
    }
}

fn normalize_keyword(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A non-negative whole number, surrounding whitespace allowed.
fn parse_number(text: &str) -> Option<u32> {
    text.trim().parse().ok()
}
