//! Resources: server://notes and note://{id}

use crate::types::{McpError, McpResult, ReadResourceResult, ResourceContent};

use super::registry::ResourceContext;
use super::templates::NOTES_URI;

pub async fn read_notes(ctx: &ResourceContext<'_>) -> McpResult<ReadResourceResult> {
    let text = {
        let store = ctx.store.lock().await;
        serde_json::to_string_pretty(store.notes())
            .map_err(|e| McpError::InternalError(e.to_string()))?
    };

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::text(NOTES_URI, "application/json", text)],
    })
}

pub async fn read_note(
    uri: &str,
    id: u64,
    ctx: &ResourceContext<'_>,
) -> McpResult<ReadResourceResult> {
    let text = {
        let store = ctx.store.lock().await;
        let note = store
            .note(id)
            .map_err(|_| McpError::ResourceNotFound(uri.to_string()))?;
        serde_json::to_string_pretty(note)
            .map_err(|e| McpError::InternalError(e.to_string()))?
    };

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::text(uri, "application/json", text)],
    })
}
