//! Tool: get_current_time - Report the server clock.

use async_trait::async_trait;
use chrono::{FixedOffset, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::executor::ToolContext;
use super::registry::ToolHandler;

#[derive(Debug, Deserialize)]
struct TimeParams {
    #[serde(default = "default_timezone")]
    timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

pub struct GetCurrentTime;

#[async_trait]
impl ToolHandler for GetCurrentTime {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_current_time".to_string(),
            description: Some("Returns the current server time in ISO 8601 format".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "timezone": {
                        "type": "string",
                        "description": "'UTC' or a fixed offset such as '+05:30'",
                        "default": "UTC"
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: &ToolContext) -> McpResult<ToolCallResult> {
        let params: TimeParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let now = Utc::now();
        let formatted = if is_utc(&params.timezone) {
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        } else {
            match parse_offset(&params.timezone) {
                Some(offset) => now
                    .with_timezone(&offset)
                    .to_rfc3339_opts(SecondsFormat::Millis, false),
                None => {
                    return Ok(ToolCallResult::error(format!(
                        "Unsupported timezone: {} (use 'UTC' or an offset like '+02:00')",
                        params.timezone
                    )))
                }
            }
        };

        Ok(ToolCallResult::text(format!("Current time: {formatted}")).with_structured(json!({
            "time": formatted,
            "timezone": params.timezone,
        })))
    }
}

fn is_utc(tz: &str) -> bool {
    matches!(tz.trim().to_ascii_uppercase().as_str(), "UTC" | "Z" | "GMT")
}

/// Parse `+HH:MM` / `-HH:MM`.
fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let tz = tz.trim();
    let sign = match tz.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let (hours, minutes) = tz[1..].split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
