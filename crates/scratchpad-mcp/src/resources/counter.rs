//! Resource: server://counter

use crate::types::{McpResult, ReadResourceResult, ResourceContent};

use super::registry::ResourceContext;
use super::templates::COUNTER_URI;

pub async fn read_counter(ctx: &ResourceContext<'_>) -> McpResult<ReadResourceResult> {
    let counter = ctx.store.lock().await.counter();
    Ok(ReadResourceResult {
        contents: vec![ResourceContent::text(
            COUNTER_URI,
            "text/plain",
            counter.to_string(),
        )],
    })
}
