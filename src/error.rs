//! Library error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Send API error ({status}): {body}")]
    SendApi { status: u16, body: String },

    #[error("Report store error ({status}): {body}")]
    Store { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
