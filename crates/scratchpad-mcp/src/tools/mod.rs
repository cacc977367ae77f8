//! MCP tool implementations.

pub mod add_note;
pub mod calculate;
pub mod executor;
pub mod get_current_time;
pub mod get_notes;
pub mod increment_counter;
pub mod long_running_task;
pub mod registry;
pub mod schema;

pub use executor::{ToolContext, ToolExecutor, ToolOutcome};
pub use registry::{ToolHandler, ToolRegistry};
