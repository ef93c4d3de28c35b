//! Report-collection dialogue.
//!
//! - [`input`] reduces webhook events to controller inputs
//! - [`controller`] is the per-user state machine
//! - [`session`] stores one session per user
//! - [`prompts`] renders the bot's questions
//! - [`finalizer`] turns a completed draft into a [`Report`]

pub mod controller;
pub mod draft;
pub mod finalizer;
pub mod input;
pub mod payload;
pub mod prompts;
pub mod session;
pub mod species;
pub mod state;

pub use controller::{DialogueController, Keywords, Step, Transition};
pub use draft::{Amount, AmountBucket, BirdType, CompletedDraft, Draft, Height, HeightBucket};
pub use finalizer::{Report, ReportFinalizer, ReportValue};
pub use input::{normalize, Input};
pub use payload::Payload;
pub use prompts::{PromptRenderer, Reply};
pub use session::SessionStore;
pub use species::Species;
pub use state::{DialogueState, Session};
