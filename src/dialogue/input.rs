//! Event normalizer.
//!
//! Reduces a raw messaging event to the handful of input kinds the
//! controller understands. Transport bookkeeping (delivery and read receipts,
//! account linking, opt-in, echoes of our own messages) yields `None`.

use crate::messenger::webhook::MessagingEvent;

use super::payload::Payload;

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Location { lat: f64, lng: f64 },
    FreeText(String),
    QuickReply(Payload),
    Postback(Payload),
    /// Something the bot cannot act on, with a short reason for the log.
    Unrecognized(String),
}

impl Input {
    /// Button payload carried by the input, if any.
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Input::QuickReply(payload) | Input::Postback(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Input::Location { .. } => "location",
            Input::FreeText(_) => "free_text",
            Input::QuickReply(_) => "quick_reply",
            Input::Postback(_) => "postback",
            Input::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Normalize one messaging event.
pub fn normalize(event: &MessagingEvent) -> Option<Input> {
    if let Some(message) = &event.message {
        if message.is_echo {
            tracing::debug!("Ignoring echo of message {:?}", message.mid);
            return None;
        }

        // Quick replies also carry their title as text; the payload wins.
        if let Some(quick_reply) = &message.quick_reply {
            return Some(Input::QuickReply(Payload::parse(&quick_reply.payload)));
        }

        if let Some(text) = &message.text {
            return Some(Input::FreeText(text.clone()));
        }

        if !message.attachments.is_empty() {
            let location = message
                .attachments
                .iter()
                .filter(|attachment| attachment.kind == "location")
                .find_map(|attachment| attachment.payload.as_ref()?.coordinates);

            return Some(match location {
                Some(coordinates) => Input::Location {
                    lat: coordinates.lat,
                    lng: coordinates.lng,
                },
                None => {
                    let kinds: Vec<&str> = message
                        .attachments
                        .iter()
                        .map(|attachment| attachment.kind.as_str())
                        .collect();
                    Input::Unrecognized(format!("attachments without location: {:?}", kinds))
                }
            });
        }

        return Some(Input::Unrecognized("empty message".to_string()));
    }

    if let Some(postback) = &event.postback {
        return Some(Input::Postback(Payload::parse(&postback.payload)));
    }

    if event.delivery.is_some() {
        tracing::debug!("Delivery confirmation from {}", event.sender.id);
    } else if event.read.is_some() {
        tracing::debug!("Read receipt from {}", event.sender.id);
    } else if event.account_linking.is_some() {
        tracing::debug!("Account linking event from {}", event.sender.id);
    } else if event.optin.is_some() {
        tracing::debug!("Opt-in from {}", event.sender.id);
    } else {
        return Some(Input::Unrecognized("unknown messaging event".to_string()));
    }

    None
}
