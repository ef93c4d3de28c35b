//! Command-line entry: argument parsing and process bootstrap.

mod args;
mod bootstrap;

pub use args::Args;
pub use bootstrap::{build_dispatcher, init_config, init_tracing, initialize, BotContext};
