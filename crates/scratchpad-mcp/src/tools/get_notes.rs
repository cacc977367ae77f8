//! Tool: get_notes - Return the most recent notes, optionally filtered by tag.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use scratchpad::Note;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::executor::ToolContext;
use super::registry::ToolHandler;

#[derive(Debug, Deserialize)]
struct GetNotesParams {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_limit() -> usize {
    10
}

pub struct GetNotes;

#[async_trait]
impl ToolHandler for GetNotes {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_notes".to_string(),
            description: Some(
                "Retrieves notes from the server, optionally filtered by tags".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of notes to return (0 for all)",
                        "minimum": 0,
                        "default": 10
                    },
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Filter notes by these tags"
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> McpResult<ToolCallResult> {
        let params: GetNotesParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let notes: Vec<Note> = {
            let store = ctx.store.lock().await;
            store
                .recent_notes(params.limit, &params.tags)
                .into_iter()
                .cloned()
                .collect()
        };

        Ok(ToolCallResult::json(&notes).with_structured(json!({
            "notes": notes,
            "count": notes.len(),
        })))
    }
}
