//! Resource: server://status

use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::types::{McpError, McpResult, ReadResourceResult, ResourceContent, MCP_VERSION};

use super::registry::ResourceContext;
use super::templates::STATUS_URI;

pub async fn read_status(ctx: &ResourceContext<'_>) -> McpResult<ReadResourceResult> {
    let (notes_count, counter) = {
        let store = ctx.store.lock().await;
        (store.note_count(), store.counter())
    };

    let status = json!({
        "status": "healthy",
        "server": ctx.server_info.name,
        "version": ctx.server_info.version,
        "protocol_version": MCP_VERSION,
        "active_sessions": ctx.sessions.len(),
        "notes_count": notes_count,
        "counter": counter,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    });

    let text = serde_json::to_string_pretty(&status)
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::text(STATUS_URI, "application/json", text)],
    })
}
