//! MCP prompt implementations and argument completion.

pub mod completion;
pub mod greeting;
pub mod registry;
pub mod summarize_notes;

pub use registry::PromptRegistry;
