//! Scratchpad MCP Server: a bidirectional JSON-RPC session engine exposing
//! tools, resources, and prompts, with streamed notifications.

pub mod config;
pub mod logging;
pub mod notifications;
pub mod prompts;
pub mod protocol;
pub mod repl;
pub mod resources;
pub mod session;
pub mod store;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use protocol::ProtocolHandler;
pub use session::{Session, SessionTable};
pub use store::{shared_store, SharedStore};
pub use transport::StdioTransport;
