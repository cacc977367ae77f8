//! Session lifecycle and the registry of connected clients.

pub mod state;
pub mod table;

pub use state::{OutboxReceiver, OutboxSender, Session, SessionId, SessionPhase};
pub use table::SessionTable;
