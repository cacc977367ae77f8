//! Per-session notification delivery loop with idle keep-alives.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::outbound::Notification;
use crate::session::{OutboxReceiver, Session, SessionId};
use crate::types::{to_value, McpError, McpResult};

pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(30);

/// One item handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Push {
    Message(Value),
    KeepAlive,
}

/// Anywhere a transport can push server-initiated traffic.
pub trait NotificationSink: Send + 'static {
    fn push(&mut self, item: Push) -> McpResult<()>;
}

impl NotificationSink for mpsc::UnboundedSender<Push> {
    fn push(&mut self, item: Push) -> McpResult<()> {
        self.send(item)
            .map_err(|_| McpError::Transport("notification stream closed".to_string()))
    }
}

/// Why a channel stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelExit {
    SessionClosed,
    SinkClosed,
    OutboxClosed,
}

/// Drains one session's outbox into a sink.
pub struct NotificationChannel {
    session_id: SessionId,
    handle: JoinHandle<ChannelExit>,
}

impl NotificationChannel {
    /// Attach a sink to the session's outbox. At most one channel per session.
    pub fn spawn<S: NotificationSink>(
        session: &Arc<Session>,
        sink: S,
        keepalive: Duration,
    ) -> McpResult<Self> {
        if session.is_closed() {
            return Err(McpError::SessionClosed(session.id().to_string()));
        }
        let outbox = session.take_outbox().ok_or_else(|| {
            McpError::InvalidRequest(format!(
                "Session {} already has a notification stream",
                session.id()
            ))
        })?;

        let unsent = session.take_unsent();

        let session_id = session.id().clone();
        tracing::debug!(session = %session_id, "Notification channel attached");
        let handle = tokio::spawn(run(Arc::downgrade(session), outbox, unsent, sink, keepalive));
        Ok(Self { session_id, handle })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub async fn join(self) -> ChannelExit {
        match self.handle.await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::error!(session = %self.session_id, "Notification channel failed: {e}");
                ChannelExit::SinkClosed
            }
        }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

async fn run<S: NotificationSink>(
    session: Weak<Session>,
    mut outbox: OutboxReceiver,
    mut unsent: Option<Notification>,
    mut sink: S,
    keepalive: Duration,
) -> ChannelExit {
    let mut closed = match session.upgrade() {
        Some(session) => session.closed_signal(),
        None => return ChannelExit::SessionClosed,
    };

    loop {
        if *closed.borrow() {
            return ChannelExit::SessionClosed;
        }

        // `None` means the idle timer fired.
        let next = match unsent.take() {
            Some(notification) => Some(notification),
            None => tokio::select! {
                biased;
                changed = closed.changed() => {
                    if changed.is_err() || *closed.borrow() {
                        return ChannelExit::SessionClosed;
                    }
                    continue;
                }
                next = outbox.recv() => match next {
                    Some(notification) => Some(notification),
                    None => return ChannelExit::OutboxClosed,
                },
                _ = tokio::time::sleep(keepalive) => None,
            },
        };

        let item = match next.as_ref().and_then(Notification::to_envelope) {
            Some(envelope) => Push::Message(to_value(&envelope)),
            None => Push::KeepAlive,
        };

        if let Err(e) = sink.push(item) {
            tracing::debug!("Notification sink closed: {e}");
            // The item in hand and everything behind it wait for the next channel.
            if let Some(session) = session.upgrade() {
                let unsent = next.filter(|n| !matches!(n, Notification::KeepAlive));
                session.restore_outbox(outbox, unsent);
            }
            return ChannelExit::SinkClosed;
        }

        // A live stream counts as activity, keep-alives included.
        match session.upgrade() {
            Some(session) => session.touch(),
            None => return ChannelExit::SessionClosed,
        }
    }
}
