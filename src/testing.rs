//! Test doubles shared by unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::dialogue::finalizer::Report;
use crate::dialogue::prompts::Reply;
use crate::error::{BotError, Result};
use crate::messenger::client::Messenger;
use crate::messenger::webhook::MessagingEvent;
use crate::store::{ReportStore, StoredReport};

/// Records every reply instead of sending it. Optionally fails the first
/// `fail_first` sends after recording them, or stalls the first `slow_first`
/// sends for `delay` before recording them.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(String, Reply)>>,
    fail_first: AtomicUsize,
    slow_first: AtomicUsize,
    delay: Duration,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(count: usize) -> Self {
        Self {
            fail_first: AtomicUsize::new(count),
            ..Self::default()
        }
    }

    pub fn slow_first(count: usize, delay: Duration) -> Self {
        Self {
            slow_first: AtomicUsize::new(count),
            delay,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, Reply)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<Reply> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, reply)| reply.clone())
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, recipient: &str, reply: &Reply) -> Result<()> {
        let slow = self
            .slow_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if slow {
            tokio::time::sleep(self.delay).await;
        }
        self.sent.lock().push((recipient.to_string(), reply.clone()));
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(BotError::SendApi {
                status: 400,
                body: "rejected".to_string(),
            });
        }
        Ok(())
    }
}

/// Store that rejects everything but counts the attempts.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl ReportStore for FailingStore {
    async fn submit(&self, _report: &Report) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(BotError::Store {
            status: 503,
            body: "unavailable".to_string(),
        })
    }

    async fn list(&self) -> Result<Vec<StoredReport>> {
        Err(BotError::Store {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// Messaging event from `sender` with the given members merged in.
pub fn event(sender: &str, members: serde_json::Value) -> MessagingEvent {
    let mut base = serde_json::json!({
        "sender": {"id": sender},
        "recipient": {"id": "page-1"},
        "timestamp": 1,
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), members.as_object()) {
        base.extend(extra.clone());
    }
    serde_json::from_value(base).expect("valid messaging event")
}

pub fn text_event(sender: &str, text: &str) -> MessagingEvent {
    event(sender, serde_json::json!({"message": {"text": text}}))
}

pub fn quick_reply_event(sender: &str, payload: &str) -> MessagingEvent {
    event(
        sender,
        serde_json::json!({"message": {"text": "x", "quick_reply": {"payload": payload}}}),
    )
}

pub fn postback_event(sender: &str, payload: &str) -> MessagingEvent {
    event(sender, serde_json::json!({"postback": {"payload": payload}}))
}

pub fn location_event(sender: &str, lat: f64, lng: f64) -> MessagingEvent {
    event(
        sender,
        serde_json::json!({"message": {"attachments": [
            {"type": "location", "payload": {"coordinates": {"lat": lat, "long": lng}}}
        ]}}),
    )
}
