//! Progress reporting for long-running tool invocations.

use super::outbound::Notification;
use crate::session::{OutboxSender, Session, SessionId};
use crate::types::ProgressToken;

/// Writes progress notifications into the originating session's outbox.
///
/// Holds the session id and an outbox sender only, so reports made after the
/// session is torn down are dropped without error.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    session_id: SessionId,
    token: Option<ProgressToken>,
    outbox: OutboxSender,
}

impl ProgressSink {
    pub fn new(session: &Session, token: Option<ProgressToken>) -> Self {
        Self {
            session_id: session.id().clone(),
            token,
            outbox: session.outbox_sender(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn token(&self) -> Option<&ProgressToken> {
        self.token.as_ref()
    }

    /// Queue one progress update. Returns `false` when the session is gone.
    pub fn report(&self, progress: u64, total: u64, message: impl Into<String>) -> bool {
        let sent = self
            .outbox
            .send(Notification::Progress {
                token: self.token.clone(),
                progress,
                total,
                message: message.into(),
            })
            .is_ok();
        if !sent {
            tracing::trace!(session = %self.session_id, "Progress dropped, session closed");
        }
        sent
    }
}
