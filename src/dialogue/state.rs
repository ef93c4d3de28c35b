//! Dialogue states and the per-user session they live in.

use serde::Serialize;

use super::draft::{AmountBucket, Draft};

/// Resting states of an active conversation.
///
/// `Idle` is the absence of a session and `Complete` is a transition result,
/// so neither appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    AwaitingLocation,
    AwaitingAmount,
    AwaitingAmountExact,
    /// The menu shown depends on the amount answered before.
    AwaitingSpecies { menu: AmountBucket },
    AwaitingHeight,
    AwaitingHeightExact,
}

/// Field a typed number fills while an exact-value question is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExactField {
    Amount,
    Height,
}

impl DialogueState {
    pub fn pending_free_text_field(self) -> Option<ExactField> {
        match self {
            DialogueState::AwaitingAmountExact => Some(ExactField::Amount),
            DialogueState::AwaitingHeightExact => Some(ExactField::Height),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DialogueState::AwaitingLocation => "awaiting_location",
            DialogueState::AwaitingAmount => "awaiting_amount",
            DialogueState::AwaitingAmountExact => "awaiting_amount_exact",
            DialogueState::AwaitingSpecies { .. } => "awaiting_species",
            DialogueState::AwaitingHeight => "awaiting_height",
            DialogueState::AwaitingHeightExact => "awaiting_height_exact",
        }
    }
}

/// One user's conversation: where it is and what has been answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub state: DialogueState,
    pub draft: Draft,
}

impl Session {
    pub fn new(state: DialogueState, draft: Draft) -> Self {
        Self { state, draft }
    }

    pub fn pending_free_text_field(&self) -> Option<ExactField> {
        self.state.pending_free_text_field()
    }

    /// Same draft, different state.
    pub fn with_state(&self, state: DialogueState) -> Self {
        Self {
            state,
            draft: self.draft.clone(),
        }
    }
}
