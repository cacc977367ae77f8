//! MCP resource implementations.

pub mod counter;
pub mod notes;
pub mod registry;
pub mod status;
pub mod templates;

pub use registry::{ResourceContext, ResourceRegistry};
pub use templates::{COUNTER_URI, NOTES_URI, NOTE_URI_PREFIX, STATUS_URI};
