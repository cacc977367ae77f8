//! Scratchpad: shared server state for the scratchpad MCP server: a counter, a note collection, and arithmetic.

pub mod calc;
pub mod store;
pub mod types;

pub use calc::{calculate, Operation};
pub use store::ScratchpadStore;
pub use types::*;
