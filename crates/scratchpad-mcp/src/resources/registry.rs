//! Resource registration and dispatch.

use crate::session::SessionTable;
use crate::store::SharedStore;
use crate::types::{
    Implementation, McpError, McpResult, ReadResourceResult, ResourceDefinition,
    ResourceTemplateDefinition,
};

use super::templates::{self, COUNTER_URI, NOTES_URI, NOTE_URI_PREFIX, STATUS_URI};
use super::{counter, notes, status};

/// Shared state a resource reader may look at.
pub struct ResourceContext<'a> {
    pub store: &'a SharedStore,
    pub sessions: &'a SessionTable,
    pub server_info: &'a Implementation,
}

pub struct ResourceRegistry;

impl ResourceRegistry {
    pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
        templates::list_templates()
    }

    pub fn list_resources() -> Vec<ResourceDefinition> {
        templates::list_resources()
    }

    /// Whether `uri` names a static catalog entry (and so may be subscribed to).
    pub fn contains(uri: &str) -> bool {
        matches!(uri, STATUS_URI | NOTES_URI | COUNTER_URI)
    }

    pub async fn read(uri: &str, ctx: &ResourceContext<'_>) -> McpResult<ReadResourceResult> {
        match uri {
            STATUS_URI => status::read_status(ctx).await,
            NOTES_URI => notes::read_notes(ctx).await,
            COUNTER_URI => counter::read_counter(ctx).await,
            _ => {
                if let Some(id_str) = uri.strip_prefix(NOTE_URI_PREFIX) {
                    let id: u64 = id_str
                        .parse()
                        .map_err(|_| McpError::InvalidParams(format!("Invalid note ID: {id_str}")))?;
                    notes::read_note(uri, id, ctx).await
                } else {
                    Err(McpError::ResourceNotFound(uri.to_string()))
                }
            }
        }
    }
}
