//! Tool registration and lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::executor::ToolContext;
use super::{add_note, calculate, get_current_time, get_notes, increment_counter, long_running_task};

/// A callable tool.
///
/// Arguments have already been checked against `definition().input_schema`
/// when `call` runs.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Whether calls must pass the auth hook regardless of configuration.
    fn privileged(&self) -> bool {
        false
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> McpResult<ToolCallResult>;
}

struct ToolEntry {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
    privileged: bool,
}

/// Immutable after construction; shared by every session.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in scratchpad tools. Names in `privileged` consult the auth hook.
    pub fn builtin(privileged: &[String]) -> Self {
        let handlers: Vec<Arc<dyn ToolHandler>> = vec![
            Arc::new(get_current_time::GetCurrentTime),
            Arc::new(increment_counter::IncrementCounter),
            Arc::new(add_note::AddNote),
            Arc::new(get_notes::GetNotes),
            Arc::new(calculate::Calculate),
            Arc::new(long_running_task::LongRunningTask),
        ];

        let mut registry = Self::new();
        for handler in handlers {
            let name = handler.definition().name;
            let is_privileged = handler.privileged() || privileged.iter().any(|p| p == &name);
            registry.register(handler, is_privileged);
        }
        for name in privileged {
            if !registry.contains(name) {
                tracing::warn!("Privileged tool '{name}' is not registered");
            }
        }
        registry
    }

    /// Add a tool, replacing any previous tool of the same name.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>, privileged: bool) {
        let definition = handler.definition();
        let name = definition.name.clone();
        if self
            .tools
            .insert(
                name.clone(),
                ToolEntry {
                    definition,
                    handler,
                    privileged,
                },
            )
            .is_some()
        {
            tracing::warn!("Tool '{name}' registered twice, keeping the latest");
        }
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|e| e.definition.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|e| Arc::clone(&e.handler))
    }

    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name).map(|e| &e.definition)
    }

    pub fn is_privileged(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|e| e.privileged)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let registry = ToolRegistry::builtin(&[]);
        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        for expected in [
            "add_note",
            "calculate",
            "get_current_time",
            "get_notes",
            "increment_counter",
            "long_running_task",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_every_schema_is_an_object_schema() {
        for tool in ToolRegistry::builtin(&[]).list_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn test_privileged_flag() {
        let registry = ToolRegistry::builtin(&["add_note".to_string()]);
        assert!(registry.is_privileged("add_note"));
        assert!(!registry.is_privileged("calculate"));
    }
}
