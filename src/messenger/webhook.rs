//! Inbound webhook wire format.
//!
//! Only the fields the bot reads are modelled; unknown fields are ignored so
//! newer platform versions keep deserializing.

use serde::{Deserialize, Serialize};

/// Body of a `POST /webhook` delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Subscription type, `"page"` for Messenger.
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One page entry. Deliveries may batch several.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
}

/// A single messaging event. Exactly one of the optional members is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    pub recipient: Participant,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback: Option<Postback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_linking: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optin: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_reply: Option<QuickReply>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickReply {
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Postback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// `location`, `image`, `audio`, `video`, `file`, `fallback`...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<AttachmentPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Shared location. The platform spells longitude `long`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    #[serde(rename = "long")]
    pub lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_batched_delivery() {
        let json = r#"{
            "object": "page",
            "entry": [{
                "id": "PAGE_ID",
                "time": 1458692752478,
                "messaging": [
                    {
                        "sender": {"id": "USER_ID"},
                        "recipient": {"id": "PAGE_ID"},
                        "timestamp": 1458692752478,
                        "message": {
                            "mid": "mid.1457764197618:41d102a3e1ae206a38",
                            "text": "hello",
                            "quick_reply": {"payload": "HEIGHT_LOW"}
                        }
                    },
                    {
                        "sender": {"id": "USER_ID"},
                        "recipient": {"id": "PAGE_ID"},
                        "timestamp": 1458692752479,
                        "delivery": {"mids": ["mid.1"], "watermark": 1458668856253, "seq": 37}
                    }
                ]
            }]
        }"#;

        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.object, "page");
        let events = &payload.entry[0].messaging;
        assert_eq!(events.len(), 2);

        let message = events[0].message.as_ref().unwrap();
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert_eq!(message.quick_reply.as_ref().unwrap().payload, "HEIGHT_LOW");
        assert!(!message.is_echo);
        assert!(events[1].delivery.is_some());
        assert!(events[1].message.is_none());
    }

    #[test]
    fn deserializes_location_attachment() {
        let json = r#"{
            "mid": "mid.1",
            "attachments": [{
                "type": "location",
                "payload": {"coordinates": {"lat": 32.08, "long": 34.8}}
            }]
        }"#;

        let message: Message = serde_json::from_str(json).unwrap();
        let coordinates = message.attachments[0]
            .payload
            .as_ref()
            .and_then(|p| p.coordinates)
            .unwrap();
        assert_eq!(coordinates, Coordinates { lat: 32.08, lng: 34.8 });
    }

    #[test]
    fn ignores_unknown_fields() {
        let json = r#"{
            "sender": {"id": "1"},
            "recipient": {"id": "2"},
            "timestamp": 1,
            "postback": {"title": "חסידה", "payload": "Bird_Picture_Hasida", "mid": "m"},
            "brand_new_field": true
        }"#;
        let event: MessagingEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.postback.unwrap().payload, "Bird_Picture_Hasida");
    }
}
