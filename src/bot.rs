//! Dispatcher: glue between the webhook and the dialogue.
//!
//! ```text
//! MessagingEvent -> normalize -> SessionStore::advance(controller.step)
//!                                        |
//!                     Complete? -> finalize -> submit (spawned)
//!                                        |
//!                               replies -> outbox per recipient -> Messenger
//! ```
//!
//! Each recipient has at most one send task at a time. Replies produced while
//! it is busy queue behind it, so a user sees answers in the order their
//! events were handled, even across webhook deliveries.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::dialogue::controller::{DialogueController, Step, Transition};
use crate::dialogue::finalizer::{Report, ReportFinalizer};
use crate::dialogue::input::{normalize, Input};
use crate::dialogue::prompts::Reply;
use crate::dialogue::session::{run_sweeper, SessionStore};
use crate::messenger::client::Messenger;
use crate::messenger::webhook::MessagingEvent;
use crate::store::ReportStore;

/// Reply batches waiting behind a recipient's running send task.
type Outboxes = DashMap<String, VecDeque<Vec<Reply>>>;

/// What one event produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub input: Input,
    pub replies: Vec<Reply>,
    pub report: Option<Report>,
}

pub struct Dispatcher {
    sessions: Arc<SessionStore>,
    controller: DialogueController,
    finalizer: ReportFinalizer,
    messenger: Arc<dyn Messenger>,
    store: Arc<dyn ReportStore>,
    outboxes: Arc<Outboxes>,
    tasks: TaskTracker,
}

impl Dispatcher {
    pub fn new(
        controller: DialogueController,
        finalizer: ReportFinalizer,
        messenger: Arc<dyn Messenger>,
        store: Arc<dyn ReportStore>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            controller,
            finalizer,
            messenger,
            store,
            outboxes: Arc::new(DashMap::new()),
            tasks: TaskTracker::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Process one messaging event.
    ///
    /// Returns `None` for events that carry nothing to act on (receipts,
    /// echoes). Sends and report submission run in the background; use
    /// [`Dispatcher::drain`] to wait for them.
    pub fn handle(&self, event: &MessagingEvent) -> Option<DispatchOutcome> {
        self.handle_all(std::iter::once(event)).pop()
    }

    /// Process the events of one delivery in order.
    ///
    /// Replies are batched per recipient and queued on the recipient's
    /// outbox, so a user gets answers in the order their events arrived.
    pub fn handle_all<'a>(
        &self,
        events: impl IntoIterator<Item = &'a MessagingEvent>,
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        let mut outbox: Vec<(String, Vec<Reply>)> = Vec::new();

        for event in events {
            let Some(outcome) = self.process(event) else {
                continue;
            };
            let user_id = &event.sender.id;
            match outbox.iter_mut().find(|(recipient, _)| recipient == user_id) {
                Some((_, queued)) => queued.extend(outcome.replies.iter().cloned()),
                None => outbox.push((user_id.clone(), outcome.replies.clone())),
            }
            outcomes.push(outcome);
        }

        for (recipient, replies) in outbox {
            self.send_all(recipient, replies);
        }
        outcomes
    }

    fn process(&self, event: &MessagingEvent) -> Option<DispatchOutcome> {
        let input = normalize(event)?;
        let user_id = event.sender.id.as_str();
        tracing::info!("Received {} from {}", input.kind(), user_id);

        let Step {
            transition,
            mut replies,
        } = self
            .sessions
            .advance(user_id, |current| self.controller.step(user_id, current, &input));

        let report = match transition {
            Transition::Unchanged => None,
            Transition::Start(session) | Transition::Update(session) => {
                tracing::debug!("Session {} now {}", user_id, session.state.name());
                None
            }
            Transition::End => {
                tracing::info!("Session {} ended without report", user_id);
                None
            }
            Transition::Complete(draft) => {
                let report = self.finalizer.finalize(draft, Utc::now());
                tracing::info!("Report completed by {}: {}", user_id, report.description);
                replies.extend(self.controller.renderer().completion(&report));
                self.submit(report.clone());
                Some(report)
            }
        };

        Some(DispatchOutcome {
            input,
            replies,
            report,
        })
    }

    fn send_all(&self, recipient: String, replies: Vec<Reply>) {
        if replies.is_empty() {
            return;
        }
        match self.outboxes.entry(recipient.clone()) {
            Entry::Occupied(mut queued) => queued.get_mut().push_back(replies),
            Entry::Vacant(vacant) => {
                vacant.insert(VecDeque::new());
                let messenger = self.messenger.clone();
                let outboxes = self.outboxes.clone();
                self.tasks.spawn(async move {
                    let mut batch = Some(replies);
                    while let Some(replies) = batch {
                        for reply in &replies {
                            if let Err(e) = messenger.send(&recipient, reply).await {
                                tracing::error!("Failed to send reply to {}: {}", recipient, e);
                            }
                        }
                        batch = next_batch(&outboxes, &recipient);
                    }
                });
            }
        }
    }

    fn submit(&self, report: Report) {
        let store = self.store.clone();
        self.tasks.spawn(async move {
            if let Err(e) = store.submit(&report).await {
                tracing::error!("Failed to store report: {}", e);
            }
        });
    }

    /// Wait for every spawned send and submission to finish.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Start dropping sessions idle for longer than `ttl` until `cancel` fires.
    pub fn spawn_session_sweeper(&self, ttl: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tracing::info!("Idle sessions expire after {}s", ttl.as_secs());
        tokio::spawn(run_sweeper(self.sessions.clone(), ttl, cancel))
    }
}

/// Pop the recipient's next queued batch, or retire the outbox when empty.
fn next_batch(outboxes: &Outboxes, recipient: &str) -> Option<Vec<Reply>> {
    match outboxes.entry(recipient.to_string()) {
        Entry::Occupied(mut queued) => {
            let next = queued.get_mut().pop_front();
            if next.is_none() {
                queued.remove();
            }
            next
        }
        Entry::Vacant(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::controller::Keywords;
    use crate::dialogue::prompts::PromptRenderer;
    use crate::dialogue::state::DialogueState;
    use crate::store::MemoryReportStore;
    use crate::testing::*;
    use std::sync::atomic::Ordering;

    const SERVER_URL: &str = "https://birds.example.com";

    fn dispatcher(messenger: Arc<dyn Messenger>, store: Arc<dyn ReportStore>) -> Dispatcher {
        Dispatcher::new(
            DialogueController::new(
                Keywords::default(),
                PromptRenderer::new(SERVER_URL, "דווח", "בטל"),
            ),
            ReportFinalizer::new("בוט ציפורים", "2357", SERVER_URL),
            messenger,
            store,
        )
    }

    fn report_events(user: &str) -> Vec<MessagingEvent> {
        vec![
            text_event(user, "דווח"),
            location_event(user, 32.08, 34.8),
            quick_reply_event(user, "Amount_Of_Birds_Middle"),
            postback_event(user, "Bird_Picture_Akev"),
            quick_reply_event(user, "HEIGHT_HIGH"),
        ]
    }

    mod conversation_tests {
        use super::*;

        #[tokio::test]
        async fn full_report_is_stored_and_shared() {
            let messenger = Arc::new(RecordingMessenger::new());
            let store = Arc::new(MemoryReportStore::new());
            let bot = dispatcher(messenger.clone(), store.clone());

            let outcomes: Vec<_> = report_events("u1")
                .iter()
                .map(|e| bot.handle(e).expect("event should be handled"))
                .collect();
            bot.drain().await;

            let report = outcomes.last().unwrap().report.clone().expect("report");
            assert_eq!(report.bird_type, "עקב");
            assert_eq!(report.amount.to_string(), "500-4000");
            assert_eq!(report.height.to_string(), "1000+");
            assert!(outcomes[..4].iter().all(|o| o.report.is_none()));

            let stored = store.list().await.unwrap();
            assert_eq!(stored.len(), 1);
            assert_eq!(stored[0].flock_id, "2357");

            let last = messenger.sent_to("u1").pop().unwrap();
            assert!(matches!(last, Reply::Share(card) if card.subtitle == report.description));
            assert!(!bot.sessions().contains("u1"));
        }

        #[tokio::test]
        async fn replies_are_sent_in_order() {
            let messenger = Arc::new(RecordingMessenger::new());
            let bot = dispatcher(messenger.clone(), Arc::new(MemoryReportStore::new()));

            let outcome = bot.handle(&location_event("u1", 1.0, 2.0)).unwrap();
            bot.drain().await;

            assert_eq!(messenger.sent_to("u1"), outcome.replies);
            assert_eq!(outcome.replies[0], Reply::TypingOn);
        }

        #[tokio::test]
        async fn one_delivery_keeps_reply_order_per_user() {
            let messenger = Arc::new(RecordingMessenger::new());
            let bot = dispatcher(messenger.clone(), Arc::new(MemoryReportStore::new()));

            let events = vec![
                location_event("u1", 1.0, 2.0),
                quick_reply_event("u1", "Amount_Of_Birds_Exact"),
                text_event("u2", "hello"),
            ];
            let outcomes = bot.handle_all(&events);
            bot.drain().await;

            assert_eq!(outcomes.len(), 3);
            let expected: Vec<Reply> = outcomes[..2]
                .iter()
                .flat_map(|o| o.replies.clone())
                .collect();
            assert_eq!(messenger.sent_to("u1"), expected);
            assert_eq!(messenger.sent_to("u2"), outcomes[2].replies);
        }

        #[tokio::test]
        async fn back_to_back_deliveries_keep_reply_order() {
            let messenger = Arc::new(RecordingMessenger::slow_first(1, Duration::from_millis(50)));
            let bot = dispatcher(messenger.clone(), Arc::new(MemoryReportStore::new()));

            let first = bot.handle(&location_event("u1", 1.0, 2.0)).unwrap();
            let second = bot
                .handle(&quick_reply_event("u1", "Amount_Of_Birds_High"))
                .unwrap();
            bot.drain().await;

            let expected: Vec<Reply> = first.replies.into_iter().chain(second.replies).collect();
            assert_eq!(messenger.sent_to("u1"), expected);
            assert!(bot.outboxes.is_empty());
        }

        #[tokio::test]
        async fn slow_recipient_does_not_hold_up_others() {
            let messenger = Arc::new(RecordingMessenger::slow_first(1, Duration::from_millis(200)));
            let bot = dispatcher(messenger.clone(), Arc::new(MemoryReportStore::new()));

            bot.handle(&text_event("slow", "hello"));
            bot.handle(&text_event("fast", "hello"));
            tokio::time::sleep(Duration::from_millis(50)).await;

            assert_eq!(messenger.sent_to("fast").len(), 1);
            assert!(messenger.sent_to("slow").is_empty());
            bot.drain().await;
            assert_eq!(messenger.sent_to("slow").len(), 1);
        }

        #[tokio::test]
        async fn receipts_produce_nothing() {
            let messenger = Arc::new(RecordingMessenger::new());
            let bot = dispatcher(messenger.clone(), Arc::new(MemoryReportStore::new()));

            let receipt = event("u1", serde_json::json!({"read": {"watermark": 5}}));
            assert!(bot.handle(&receipt).is_none());
            bot.drain().await;
            assert!(messenger.sent().is_empty());
        }

        #[tokio::test]
        async fn interleaved_users_stay_separate() {
            let messenger = Arc::new(RecordingMessenger::new());
            let store = Arc::new(MemoryReportStore::new());
            let bot = dispatcher(messenger.clone(), store.clone());

            bot.handle(&location_event("a", 10.0, 10.0));
            bot.handle(&location_event("b", 20.0, 20.0));
            bot.handle(&quick_reply_event("a", "Amount_Of_Birds_Low"));
            bot.handle(&quick_reply_event("b", "Amount_Of_Birds_Exact"));
            bot.handle(&text_event("b", "9000"));

            assert_eq!(
                bot.sessions().get("a").unwrap().state,
                DialogueState::AwaitingSpecies {
                    menu: crate::dialogue::draft::AmountBucket::Low
                }
            );
            let b = bot.sessions().get("b").unwrap();
            assert_eq!(
                b.state,
                DialogueState::AwaitingSpecies {
                    menu: crate::dialogue::draft::AmountBucket::High
                }
            );
            assert_eq!(b.draft.latitude, Some(20.0));
            bot.drain().await;
        }
    }

    mod failure_tests {
        use super::*;

        #[tokio::test]
        async fn store_failure_still_completes() {
            let messenger = Arc::new(RecordingMessenger::new());
            let store = Arc::new(FailingStore::default());
            let bot = dispatcher(messenger.clone(), store.clone());

            let last = report_events("u1")
                .iter()
                .filter_map(|e| bot.handle(e))
                .last()
                .unwrap();
            bot.drain().await;

            assert!(last.report.is_some());
            assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
            assert!(!bot.sessions().contains("u1"));
            assert!(matches!(
                messenger.sent_to("u1").last(),
                Some(Reply::Share(_))
            ));
        }

        #[tokio::test]
        async fn send_failure_does_not_stop_batch() {
            let messenger = Arc::new(RecordingMessenger::failing_first(1));
            let bot = dispatcher(messenger.clone(), Arc::new(MemoryReportStore::new()));

            let outcome = bot.handle(&text_event("u1", "report")).unwrap();
            bot.drain().await;

            assert_eq!(outcome.replies.len(), 2);
            assert_eq!(messenger.sent_to("u1").len(), 2);
        }

        #[tokio::test]
        async fn double_tap_submits_once() {
            let store = Arc::new(MemoryReportStore::new());
            let bot = dispatcher(Arc::new(RecordingMessenger::new()), store.clone());

            for e in report_events("u1") {
                bot.handle(&e);
            }
            bot.handle(&quick_reply_event("u1", "HEIGHT_HIGH"));
            bot.drain().await;

            assert_eq!(store.len(), 1);
        }
    }
}
