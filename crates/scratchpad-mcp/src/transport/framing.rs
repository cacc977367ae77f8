//! Message framing for newline-delimited JSON.

use serde_json::Value;

use crate::types::{JsonRpcMessage, McpError, McpResult};

pub use crate::protocol::validator::extract_id;

/// Largest single message accepted from a client (1 MiB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Parse one line of text as a raw JSON value (single envelope or batch).
pub fn parse_value(line: &str) -> McpResult<Value> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }
    if trimmed.len() > MAX_MESSAGE_SIZE {
        return Err(McpError::MessageTooLarge {
            size: trimmed.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))
}

/// Parse a single line of text as a JSON-RPC message.
pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let value = parse_value(line)?;
    serde_json::from_value(value).map_err(|e| McpError::InvalidRequest(e.to_string()))
}

/// Serialize a value to a JSON line (with trailing newline).
pub fn frame_message(value: &Value) -> McpResult<String> {
    let mut json = serde_json::to_string(value).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}
