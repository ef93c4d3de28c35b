//! Messenger Platform transport: inbound webhook types and the Send API.

pub mod client;
pub mod send;
pub mod webhook;

pub use client::{GraphMessenger, Messenger};
pub use send::{to_send_request, SendRequest};
pub use webhook::{MessagingEvent, WebhookPayload};
