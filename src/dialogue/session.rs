//! Per-user session storage.
//!
//! Sessions live in a `DashMap` keyed by the sender id. [`SessionStore::advance`]
//! runs the controller while the user's entry is held through the entry API,
//! so two events from the same user never interleave. Events from different
//! users only contend when they hash to the same shard.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::server::types::SessionInfo;

use super::controller::{Step, Transition};
use super::state::Session;

/// Period of the idle-session sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub session: Session,
    pub started_at: Instant,
    pub last_activity: Instant,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        let now = Instant::now();
        Self {
            session,
            started_at: now,
            last_activity: now,
        }
    }

    pub fn is_idle(&self, max_idle: Duration) -> bool {
        self.last_activity.elapsed() > max_idle
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the user's current session and apply the transition
    /// it returns. The user's entry stays locked for the duration of `f`.
    pub fn advance<F>(&self, user_id: &str, f: F) -> Step
    where
        F: FnOnce(Option<&Session>) -> Step,
    {
        match self.sessions.entry(user_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let step = f(Some(&occupied.get().session));
                match &step.transition {
                    Transition::Unchanged => occupied.get_mut().last_activity = Instant::now(),
                    Transition::Start(session) => {
                        occupied.insert(SessionEntry::new(session.clone()));
                    }
                    Transition::Update(session) => {
                        let entry = occupied.get_mut();
                        entry.session = session.clone();
                        entry.last_activity = Instant::now();
                    }
                    Transition::End | Transition::Complete(_) => {
                        occupied.remove();
                    }
                }
                step
            }
            Entry::Vacant(vacant) => {
                let step = f(None);
                match &step.transition {
                    Transition::Start(session) | Transition::Update(session) => {
                        vacant.insert(SessionEntry::new(session.clone()));
                    }
                    _ => {}
                }
                step
            }
        }
    }

    pub fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.get(user_id).map(|entry| entry.session.clone())
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    /// Snapshot of every active conversation, for the operator endpoint.
    pub fn list(&self) -> Vec<SessionInfo> {
        self.sessions
            .iter()
            .map(|entry| SessionInfo {
                user_id: entry.key().clone(),
                state: entry.value().session.state.name().to_string(),
                started_ms_ago: entry.value().started_at.elapsed().as_millis() as u64,
                idle_ms: entry.value().last_activity.elapsed().as_millis() as u64,
            })
            .collect()
    }

    /// Drop sessions with no activity for longer than `max_idle`.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_idle(&self, max_idle: Duration) -> usize {
        let idle: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_idle(max_idle))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for user_id in idle {
            // Re-check under the lock; the user may have answered meanwhile.
            if self
                .sessions
                .remove_if(&user_id, |_, entry| entry.is_idle(max_idle))
                .is_some()
            {
                tracing::info!("Cleaned up idle session: {}", user_id);
                removed += 1;
            }
        }
        removed
    }

    #[cfg(test)]
    fn backdate(&self, user_id: &str, by: Duration) {
        if let Some(mut entry) = self.sessions.get_mut(user_id) {
            entry.last_activity -= by;
        }
    }
}

/// Sweep idle sessions every [`SWEEP_INTERVAL`] until `cancel` fires.
///
/// A zero `ttl` disables the sweep.
pub(crate) async fn run_sweeper(
    store: std::sync::Arc<SessionStore>,
    ttl: Duration,
    cancel: CancellationToken,
) {
    if ttl.is_zero() {
        tracing::warn!("Session TTL is zero, idle sessions are kept");
        return;
    }
    let mut interval = tokio::time::interval(SWEEP_INTERVAL.min(ttl));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let removed = store.cleanup_idle(ttl);
                if removed > 0 {
                    tracing::debug!("Session sweep removed {} idle sessions", removed);
                }
            }
        }
    }
    tracing::debug!("Session sweeper stopped");
}
