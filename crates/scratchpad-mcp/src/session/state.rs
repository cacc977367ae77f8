//! Per-client session state: lifecycle phase, subscriptions, and the notification outbox.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::notifications::Notification;
use crate::protocol::auth::Credentials;
use crate::types::{ClientCapabilities, Implementation, LogLevel, McpError, McpResult};

pub type OutboxSender = mpsc::UnboundedSender<Notification>;
pub type OutboxReceiver = mpsc::UnboundedReceiver<Notification>;

/// Opaque session identifier (a v4 UUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::borrow::Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Ready,
    Closed,
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    initialized: bool,
    protocol_version: Option<String>,
    client_info: Option<Implementation>,
    client_capabilities: ClientCapabilities,
    subscriptions: BTreeSet<String>,
    credentials: Option<Credentials>,
    log_level: LogLevel,
    last_activity: Instant,
}

/// The outbox receiver while no channel owns it, plus an item a failed channel
/// dequeued but could not deliver.
#[derive(Debug, Default)]
struct OutboxSlot {
    receiver: Option<OutboxReceiver>,
    unsent: Option<Notification>,
}

/// One connected client.
///
/// State lives behind a short-lived mutex that is never held across an `.await`.
/// The outbox sender is cloned into progress sinks; the receiver is handed to
/// at most one notification channel at a time.
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    outbox_tx: OutboxSender,
    outbox: Mutex<OutboxSlot>,
    closed: watch::Sender<bool>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        Self {
            id,
            created_at: Utc::now(),
            state: Mutex::new(SessionState {
                phase: SessionPhase::Uninitialized,
                initialized: false,
                protocol_version: None,
                client_info: None,
                client_capabilities: ClientCapabilities::default(),
                subscriptions: BTreeSet::new(),
                credentials: None,
                log_level: LogLevel::Info,
                last_activity: Instant::now(),
            }),
            outbox_tx,
            outbox: Mutex::new(OutboxSlot {
                receiver: Some(outbox_rx),
                unsent: None,
            }),
            closed,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn outbox(&self) -> MutexGuard<'_, OutboxSlot> {
        self.outbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    pub fn is_closed(&self) -> bool {
        self.state().phase == SessionPhase::Closed
    }

    /// Record a successful `initialize` handshake. Re-initializing renegotiates.
    pub fn begin(
        &self,
        protocol_version: String,
        client_info: Option<Implementation>,
        capabilities: ClientCapabilities,
    ) -> McpResult<()> {
        let mut state = self.state();
        match state.phase {
            SessionPhase::Closed => return Err(McpError::SessionClosed(self.id.to_string())),
            SessionPhase::Ready => {
                tracing::warn!(session = %self.id, "Session re-initialized, renegotiating");
                state.initialized = false;
            }
            SessionPhase::Uninitialized => {}
        }
        state.phase = SessionPhase::Ready;
        state.protocol_version = Some(protocol_version);
        state.client_info = client_info;
        state.client_capabilities = capabilities;
        Ok(())
    }

    /// Handle the client's `initialized` signal.
    pub fn mark_initialized(&self) -> McpResult<()> {
        let mut state = self.state();
        match state.phase {
            SessionPhase::Ready => {
                state.initialized = true;
                Ok(())
            }
            SessionPhase::Uninitialized => Err(McpError::InvalidRequest(
                "initialized received before initialize".to_string(),
            )),
            SessionPhase::Closed => Err(McpError::SessionClosed(self.id.to_string())),
        }
    }

    pub fn protocol_version(&self) -> Option<String> {
        self.state().protocol_version.clone()
    }

    pub fn client_info(&self) -> Option<Implementation> {
        self.state().client_info.clone()
    }

    pub fn client_capabilities(&self) -> ClientCapabilities {
        self.state().client_capabilities.clone()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.state().credentials.clone()
    }

    pub fn set_credentials(&self, credentials: Option<Credentials>) {
        self.state().credentials = credentials;
    }

    pub fn log_level(&self) -> LogLevel {
        self.state().log_level
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.state().log_level = level;
    }

    pub fn subscribe(&self, uri: &str) -> bool {
        self.state().subscriptions.insert(uri.to_string())
    }

    pub fn unsubscribe(&self, uri: &str) -> bool {
        self.state().subscriptions.remove(uri)
    }

    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.state().subscriptions.contains(uri)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state().subscriptions.iter().cloned().collect()
    }

    pub fn touch(&self) {
        self.state().last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.state().last_activity.elapsed()
    }

    /// Queue a notification. Returns `false` once the session is torn down.
    pub fn enqueue(&self, notification: Notification) -> bool {
        if self.is_closed() {
            return false;
        }
        self.outbox_tx.send(notification).is_ok()
    }

    /// A sender feeding this session's outbox, for progress reporting.
    pub fn outbox_sender(&self) -> OutboxSender {
        self.outbox_tx.clone()
    }

    /// Detach the outbox receiver for a notification channel.
    pub fn take_outbox(&self) -> Option<OutboxReceiver> {
        self.outbox().receiver.take()
    }

    /// The item a previous channel dequeued but failed to deliver, if any.
    /// It goes out ahead of everything still in the outbox.
    pub fn take_unsent(&self) -> Option<Notification> {
        self.outbox().unsent.take()
    }

    /// Give the receiver back after a channel's sink failed, together with the
    /// item that was in hand. Dropped if closed.
    pub fn restore_outbox(&self, receiver: OutboxReceiver, unsent: Option<Notification>) {
        if self.is_closed() {
            return;
        }
        let mut slot = self.outbox();
        if slot.receiver.is_none() {
            slot.receiver = Some(receiver);
            slot.unsent = unsent;
        }
    }

    /// Whether a notification channel currently owns the outbox.
    pub fn has_channel(&self) -> bool {
        self.outbox().receiver.is_none()
    }

    /// Pull everything queued while no channel is attached.
    pub fn drain_pending(&self) -> Vec<Notification> {
        let mut slot = self.outbox();
        let mut drained: Vec<Notification> = slot.unsent.take().into_iter().collect();
        if let Some(rx) = slot.receiver.as_mut() {
            while let Ok(notification) = rx.try_recv() {
                drained.push(notification);
            }
        }
        drained
    }

    /// Resolves once the session has been torn down.
    pub fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    /// Tear the session down. Idempotent.
    pub fn close(&self) -> bool {
        {
            let mut state = self.state();
            if state.phase == SessionPhase::Closed {
                return false;
            }
            state.phase = SessionPhase::Closed;
            state.initialized = false;
            state.subscriptions.clear();
        }
        self.closed.send_replace(true);
        // Dropping the receiver makes later sends from progress sinks fail silently.
        let mut slot = self.outbox();
        slot.receiver = None;
        slot.unsent = None;
        true
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let session = Session::new(SessionId::generate());
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
        assert!(session.mark_initialized().is_err());

        session
            .begin("2024-11-05".into(), None, ClientCapabilities::default())
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(!session.is_initialized());

        session.mark_initialized().unwrap();
        assert!(session.is_initialized());

        assert!(session.close());
        assert!(!session.close());
        assert!(session.is_closed());
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_outbox_fifo_and_drain() {
        let session = Session::new(SessionId::generate());
        assert!(session.enqueue(Notification::resource_updated("server://counter")));
        assert!(session.enqueue(Notification::resource_updated("server://notes")));
        let drained = session.drain_pending();
        assert_eq!(
            drained,
            vec![
                Notification::resource_updated("server://counter"),
                Notification::resource_updated("server://notes"),
            ]
        );
        assert!(session.drain_pending().is_empty());
    }

    #[test]
    fn test_enqueue_after_close_is_discarded() {
        let session = Session::new(SessionId::generate());
        let sender = session.outbox_sender();
        session.close();
        assert!(!session.enqueue(Notification::KeepAlive));
        assert!(sender.send(Notification::KeepAlive).is_err());
    }

    #[test]
    fn test_take_and_restore_outbox() {
        let session = Session::new(SessionId::generate());
        let rx = session.take_outbox().unwrap();
        assert!(session.has_channel());
        assert!(session.take_outbox().is_none());
        session.restore_outbox(rx, None);
        assert!(!session.has_channel());
    }

    #[test]
    fn test_unsent_item_drains_first() {
        let session = Session::new(SessionId::generate());
        let rx = session.take_outbox().unwrap();
        session.enqueue(Notification::resource_updated("server://counter"));
        session.restore_outbox(rx, Some(Notification::resource_updated("server://notes")));
        assert_eq!(
            session.drain_pending(),
            vec![
                Notification::resource_updated("server://notes"),
                Notification::resource_updated("server://counter"),
            ]
        );
    }

    #[test]
    fn test_close_discards_unsent_item() {
        let session = Session::new(SessionId::generate());
        let rx = session.take_outbox().unwrap();
        session.restore_outbox(rx, Some(Notification::resource_updated("server://notes")));
        session.close();
        assert!(session.take_unsent().is_none());
        assert!(session.drain_pending().is_empty());
    }

    #[test]
    fn test_subscriptions_are_a_set() {
        let session = Session::new(SessionId::generate());
        assert!(session.subscribe("server://counter"));
        assert!(!session.subscribe("server://counter"));
        assert_eq!(session.subscriptions(), vec!["server://counter".to_string()]);
        assert!(session.unsubscribe("server://counter"));
        assert!(!session.is_subscribed("server://counter"));
    }
}
