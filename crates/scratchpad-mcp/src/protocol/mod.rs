//! MCP protocol handling: JSON-RPC dispatch, negotiation, and authorization.

pub mod auth;
pub mod handler;
pub mod method;
pub mod negotiation;
pub mod validator;

pub use auth::{AllowAll, AuthHook, BearerTokenAuth, Credentials};
pub use handler::ProtocolHandler;
pub use method::Method;
