//! Concurrent registry of live sessions.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::state::{Session, SessionId};
use crate::notifications::Notification;

/// All live sessions, keyed by id.
#[derive(Default)]
pub struct SessionTable {
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a fresh session.
    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(SessionId::generate()));
        self.sessions
            .insert(session.id().clone(), Arc::clone(&session));
        tracing::info!(session = %session.id(), "Session created");
        session
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve a client-supplied id, minting a new session when it is absent or unknown.
    pub fn get_or_create(&self, id: Option<&str>) -> Arc<Session> {
        if let Some(id) = id {
            if let Some(session) = self.get(id) {
                return session;
            }
            tracing::debug!(requested = id, "Unknown session id, creating a new session");
        }
        self.create()
    }

    /// Close and unregister a session. Idempotent.
    pub fn teardown(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.close();
                tracing::info!(session = %id, "Session torn down");
                true
            }
            None => false,
        }
    }

    pub fn teardown_all(&self) -> usize {
        let ids = self.ids();
        ids.iter().filter(|id| self.teardown(id.as_str())).count()
    }

    /// Queue a resource-updated notification on every session subscribed to `uri`.
    ///
    /// Returns how many sessions it was queued for.
    pub fn broadcast_resource_updated(&self, uri: &str) -> usize {
        let subscribers: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_subscribed(uri))
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let delivered = subscribers
            .iter()
            .filter(|session| session.enqueue(Notification::resource_updated(uri)))
            .count();
        tracing::debug!(uri, delivered, "Broadcast resource update");
        delivered
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Tear down every session idle longer than `max_idle`.
    pub fn reap_idle(&self, max_idle: Duration) -> Vec<SessionId> {
        let stale: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() > max_idle)
            .map(|entry| entry.key().clone())
            .collect();
        for id in &stale {
            self.teardown(id.as_str());
        }
        if !stale.is_empty() {
            tracing::info!(reaped = stale.len(), "Reaped idle sessions");
        }
        stale
    }

    /// Periodically reap idle sessions until `shutdown` fires.
    pub fn spawn_reaper(
        self: &Arc<Self>,
        interval: Duration,
        max_idle: Duration,
        shutdown: Arc<Notify>,
    ) -> JoinHandle<()> {
        let table = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        tracing::debug!("Session reaper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        table.reap_idle(max_idle);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create() {
        let table = SessionTable::new();
        let a = table.get_or_create(None);
        let again = table.get_or_create(Some(a.id().as_str()));
        assert_eq!(a.id(), again.id());

        let fresh = table.get_or_create(Some("not-a-session"));
        assert_ne!(fresh.id().as_str(), "not-a-session");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let table = SessionTable::new();
        let session = table.create();
        let id = session.id().clone();
        assert!(table.teardown(id.as_str()));
        assert!(!table.teardown(id.as_str()));
        assert!(session.is_closed());
        assert!(table.get(id.as_str()).is_none());
    }

    #[test]
    fn test_broadcast_only_reaches_subscribers() {
        let table = SessionTable::new();
        let a = table.create();
        let b = table.create();
        a.subscribe("server://counter");

        assert_eq!(table.broadcast_resource_updated("server://counter"), 1);
        assert_eq!(a.drain_pending().len(), 1);
        assert!(b.drain_pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_removes_idle_sessions() {
        let table = Arc::new(SessionTable::new());
        table.create();
        let shutdown = Arc::new(Notify::new());
        let handle = table.spawn_reaper(
            Duration::from_secs(60),
            Duration::from_secs(0),
            Arc::clone(&shutdown),
        );
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(table.is_empty());
        shutdown.notify_one();
        handle.await.unwrap();
    }
}
