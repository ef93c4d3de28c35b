//! flockbot: a Messenger bot that collects bird flock sightings.
//!
//! A user shares a location, answers how many birds, which species and at
//! what height, and the bot files a report with the reports service.
//!
//! ```text
//! POST /webhook -> server (signature) -> bot::Dispatcher
//!                                          |-> dialogue (per-user state machine)
//!                                          |-> messenger (Send API replies)
//!                                          '-> store (finished reports)
//! ```

pub mod bot;
pub mod cli;
pub mod dialogue;
pub mod error;
pub mod messenger;
pub mod server;
pub mod settings;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use bot::{DispatchOutcome, Dispatcher};
pub use error::{BotError, Result};
