//! Send API wire format.
//!
//! [`to_send_request`] maps a rendered [`Reply`] onto the JSON body accepted by
//! `POST /me/messages`.

use serde::{Deserialize, Serialize};

use crate::dialogue::prompts::{Card, Choice, Reply, ShareCard, MAX_QUICK_REPLIES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub recipient: Recipient,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<OutgoingMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_action: Option<SenderAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    TypingOn,
    TypingOff,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<OutgoingQuickReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<OutgoingAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum OutgoingQuickReply {
    Text { title: String, payload: String },
    Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: TemplatePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePayload {
    pub template_type: String,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    WebUrl { url: String, title: String },
    Postback { title: String, payload: String },
    ElementShare,
}

/// Build the request that delivers `reply` to `recipient`.
pub fn to_send_request(recipient: &str, reply: &Reply) -> SendRequest {
    let recipient = Recipient {
        id: recipient.to_string(),
    };
    let message = match reply {
        Reply::TypingOn => {
            return SendRequest {
                recipient,
                message: None,
                sender_action: Some(SenderAction::TypingOn),
            }
        }
        Reply::Text(text) => OutgoingMessage {
            text: Some(text.clone()),
            ..Default::default()
        },
        Reply::Menu { text, choices } => OutgoingMessage {
            text: Some(text.clone()),
            quick_replies: quick_replies(Vec::new(), choices),
            attachment: None,
        },
        Reply::LocationRequest { text, choices, .. } => OutgoingMessage {
            text: Some(text.clone()),
            quick_replies: quick_replies(vec![OutgoingQuickReply::Location], choices),
            attachment: None,
        },
        Reply::Carousel(cards) => generic_template(cards.iter().map(card_element).collect()),
        Reply::Share(card) => generic_template(vec![share_element(card)]),
    };

    SendRequest {
        recipient,
        message: Some(message),
        sender_action: None,
    }
}

/// Append `choices` as text quick replies, keeping within Messenger's limit.
fn quick_replies(
    mut replies: Vec<OutgoingQuickReply>,
    choices: &[Choice],
) -> Vec<OutgoingQuickReply> {
    let room = MAX_QUICK_REPLIES.saturating_sub(replies.len());
    if choices.len() > room {
        tracing::warn!(
            "Menu has {} choices, sending the first {}",
            choices.len(),
            room
        );
    }
    replies.extend(choices.iter().take(room).map(|choice| OutgoingQuickReply::Text {
        title: choice.label.clone(),
        payload: choice.payload.as_str().to_string(),
    }));
    replies
}

fn generic_template(elements: Vec<Element>) -> OutgoingMessage {
    OutgoingMessage {
        attachment: Some(OutgoingAttachment {
            kind: "template".to_string(),
            payload: TemplatePayload {
                template_type: "generic".to_string(),
                elements,
            },
        }),
        ..Default::default()
    }
}

fn card_element(card: &Card) -> Element {
    Element {
        title: card.title.clone(),
        subtitle: card.subtitle.clone(),
        image_url: Some(card.image_url.clone()),
        buttons: vec![
            Button::WebUrl {
                url: card.link_url.clone(),
                title: card.link_title.clone(),
            },
            Button::Postback {
                title: card.button_title.clone(),
                payload: card.payload.as_str().to_string(),
            },
        ],
    }
}

fn share_element(card: &ShareCard) -> Element {
    Element {
        title: card.title.clone(),
        subtitle: card.subtitle.clone(),
        image_url: Some(card.image_url.clone()),
        buttons: vec![Button::ElementShare],
    }
}
