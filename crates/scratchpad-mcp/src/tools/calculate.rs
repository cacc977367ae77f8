//! Tool: calculate - Basic arithmetic.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use scratchpad::{Operation, ScratchpadError};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::executor::ToolContext;
use super::registry::ToolHandler;

#[derive(Debug, Deserialize)]
struct CalculateParams {
    operation: String,
    a: f64,
    b: f64,
}

pub struct Calculate;

#[async_trait]
impl ToolHandler for Calculate {
    fn definition(&self) -> ToolDefinition {
        let operations: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        ToolDefinition {
            name: "calculate".to_string(),
            description: Some("Performs basic arithmetic calculations".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": operations,
                        "description": "The arithmetic operation"
                    },
                    "a": { "type": "number", "description": "First operand" },
                    "b": { "type": "number", "description": "Second operand" }
                },
                "required": ["operation", "a", "b"]
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: &ToolContext) -> McpResult<ToolCallResult> {
        let params: CalculateParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let op: Operation = match params.operation.parse() {
            Ok(op) => op,
            Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
        };

        match scratchpad::calculate(op, params.a, params.b) {
            Ok(result) => Ok(ToolCallResult::text(format!(
                "{} {} {} = {}",
                params.a, op, params.b, result
            ))
            .with_structured(json!({ "result": result }))),
            Err(e @ (ScratchpadError::DivisionByZero | ScratchpadError::NonFinite)) => {
                Ok(ToolCallResult::error(format!("Error: {e}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}
