//! Tool: long_running_task - Simulated work that reports progress per step.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::executor::ToolContext;
use super::registry::ToolHandler;

const MAX_STEPS: u64 = 100;
const MAX_DELAY_SECS: f64 = 10.0;

#[derive(Debug, Deserialize)]
struct TaskParams {
    #[serde(default = "default_steps")]
    steps: u64,
    #[serde(default = "default_delay")]
    delay: f64,
}

fn default_steps() -> u64 {
    5
}

fn default_delay() -> f64 {
    0.5
}

pub struct LongRunningTask;

#[async_trait]
impl ToolHandler for LongRunningTask {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "long_running_task".to_string(),
            description: Some("Simulates a long-running task with progress updates".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "integer",
                        "description": "Number of steps to simulate",
                        "minimum": 1,
                        "maximum": MAX_STEPS,
                        "default": 5
                    },
                    "delay": {
                        "type": "number",
                        "description": "Delay between steps in seconds",
                        "minimum": 0,
                        "maximum": MAX_DELAY_SECS,
                        "default": 0.5
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> McpResult<ToolCallResult> {
        let params: TaskParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
        let delay = Duration::from_secs_f64(params.delay.clamp(0.0, MAX_DELAY_SECS));

        for step in 1..=params.steps {
            tokio::time::sleep(delay).await;
            ctx.progress
                .report(step, params.steps, format!("Step {step} completed"));
        }

        Ok(ToolCallResult::text(format!(
            "Long-running task completed: {} steps",
            params.steps
        ))
        .with_structured(json!({ "steps": params.steps })))
    }
}
