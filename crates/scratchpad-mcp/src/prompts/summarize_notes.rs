//! Prompt: summarize_notes - Ask for a summary of the most recent notes.

use serde_json::Value;

use crate::store::SharedStore;
use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

use super::registry::string_arg;

const DEFAULT_MAX_NOTES: usize = 10;

pub async fn expand(args: &Value, store: &SharedStore) -> McpResult<PromptGetResult> {
    let max_notes = match string_arg(args, "max_notes") {
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            McpError::InvalidParams(format!("'max_notes' must be a non-negative integer, got {raw}"))
        })?,
        None => DEFAULT_MAX_NOTES,
    };

    let lines: Vec<String> = {
        let store = store.lock().await;
        store
            .recent_notes(max_notes, &[])
            .into_iter()
            .map(|n| format!("- {} (tags: {})", n.content, n.tags.join(", ")))
            .collect()
    };

    let notes_text = if lines.is_empty() {
        "No notes available.".to_string()
    } else {
        lines.join("\n")
    };

    Ok(PromptGetResult {
        description: Some("Summarize stored notes".to_string()),
        messages: vec![PromptMessage::user(format!(
            "Please summarize these notes:\n\n{notes_text}"
        ))],
    })
}
