//! Tool: increment_counter - Add to the shared counter.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::resources::COUNTER_URI;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::executor::ToolContext;
use super::registry::ToolHandler;

#[derive(Debug, Deserialize)]
struct IncrementParams {
    #[serde(default = "default_amount")]
    amount: i64,
}

fn default_amount() -> i64 {
    1
}

pub struct IncrementCounter;

#[async_trait]
impl ToolHandler for IncrementCounter {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "increment_counter".to_string(),
            description: Some("Increments the server counter by a specified amount".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "amount": {
                        "type": "integer",
                        "description": "Amount to increment by",
                        "default": 1
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> McpResult<ToolCallResult> {
        let params: IncrementParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let (old, new) = {
            let mut store = ctx.store.lock().await;
            match store.increment(params.amount) {
                Ok(values) => values,
                Err(e) => return Ok(ToolCallResult::error(e.to_string())),
            }
        };

        ctx.notify_resource_changed(COUNTER_URI);

        Ok(
            ToolCallResult::text(format!("Counter incremented from {old} to {new}"))
                .with_structured(json!({ "previous": old, "counter": new })),
        )
    }
}
