//! Tool: add_note - Append a note to the collection.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::resources::NOTES_URI;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::executor::ToolContext;
use super::registry::ToolHandler;

#[derive(Debug, Deserialize)]
struct AddNoteParams {
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

pub struct AddNote;

#[async_trait]
impl ToolHandler for AddNote {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "add_note".to_string(),
            description: Some("Adds a note to the server's note collection".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "The note content"
                    },
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Optional tags for the note",
                        "default": []
                    }
                },
                "required": ["content"]
            }),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> McpResult<ToolCallResult> {
        let params: AddNoteParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let note = {
            let mut store = ctx.store.lock().await;
            store.add_note(&params.content, params.tags)?.clone()
        };

        tracing::info!(note_id = note.id, "Note added");
        ctx.notify_resource_changed(NOTES_URI);

        Ok(ToolCallResult::text(format!("Note added with ID: {}", note.id))
            .with_structured(json!({ "note": note })))
    }
}
