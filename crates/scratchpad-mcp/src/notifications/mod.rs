//! Server-initiated notifications: outbox items, progress, and delivery channels.

pub mod channel;
pub mod outbound;
pub mod progress;

pub use channel::{ChannelExit, NotificationChannel, NotificationSink, Push, DEFAULT_KEEPALIVE};
pub use outbound::Notification;
pub use progress::ProgressSink;
