//! Error types and JSON-RPC error codes for the MCP server.

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP server-specific error codes.
pub mod mcp_error_codes {
    /// Server: Unauthorized (auth hook rejected a privileged tool call, or bad bearer token).
    pub const UNAUTHORIZED: i32 = -32900;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Session not initialized")]
    NotInitialized,

    #[error("Session closed: {0}")]
    SessionClosed(String),

    #[error("Message too large: {size} bytes exceeds {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Scratchpad error: {0}")]
    Scratchpad(#[from] scratchpad::ScratchpadError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The auth hook denied the call.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An error already classified with its wire code.
    #[error("{message}")]
    Protocol { code: i32, message: String },
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) | McpError::MessageTooLarge { .. } => PARSE_ERROR,
            McpError::InvalidRequest(_) | McpError::SessionClosed(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_)
            | McpError::NotInitialized
            | McpError::ResourceNotFound(_)
            | McpError::ToolNotFound(_)
            | McpError::PromptNotFound(_)
            | McpError::Scratchpad(_) => INVALID_PARAMS,
            McpError::InternalError(_)
            | McpError::Transport(_)
            | McpError::Io(_)
            | McpError::Json(_) => INTERNAL_ERROR,
            McpError::Unauthorized(_) => UNAUTHORIZED,
            McpError::Protocol { code, .. } => *code,
        }
    }

    /// Message sent to the client. Only the fault's own text, never a backtrace.
    pub fn client_message(&self) -> String {
        match self {
            McpError::InvalidParams(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.client_message(),
                data: None,
            },
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failures_are_invalid_params() {
        assert_eq!(McpError::ToolNotFound("x".into()).code(), error_codes::INVALID_PARAMS);
        assert_eq!(McpError::ResourceNotFound("x".into()).code(), error_codes::INVALID_PARAMS);
        assert_eq!(McpError::PromptNotFound("x".into()).code(), error_codes::INVALID_PARAMS);
        assert_eq!(McpError::NotInitialized.code(), error_codes::INVALID_PARAMS);
    }

    #[test]
    fn test_unknown_tool_message() {
        let err = McpError::ToolNotFound("frobnicate".into()).to_json_rpc_error(RequestId::Number(1));
        assert_eq!(err.error.message, "Unknown tool: frobnicate");
        assert_eq!(err.error.code, -32602);
        assert_eq!(err.id, RequestId::Number(1));
    }

    #[test]
    fn test_serialization_failure_is_internal() {
        let err: McpError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), error_codes::INTERNAL_ERROR);
        assert_eq!(McpError::ParseError("x".into()).code(), error_codes::PARSE_ERROR);
    }
}
