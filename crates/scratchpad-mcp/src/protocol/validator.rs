//! JSON-RPC 2.0 envelope validation.

use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, McpResult, RequestId, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    match &request.params {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(McpError::InvalidRequest(
            "params must be an object".to_string(),
        )),
    }
}

/// The id of a raw message, if it carries one.
pub fn extract_id(value: &Value) -> Option<RequestId> {
    value.get("id").map(RequestId::from_value)
}

/// A message with a method and no id expects no reply, even when malformed.
pub fn is_notification_shaped(value: &Value) -> bool {
    value.get("method").is_some() && value.get("id").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrong_version() {
        let mut req = JsonRpcRequest::new(RequestId::Number(1), "ping", None);
        req.jsonrpc = "1.0".into();
        assert_eq!(validate_request(&req).unwrap_err().code(), -32600);
    }

    #[test]
    fn test_params_must_be_object() {
        let req = JsonRpcRequest::new(RequestId::Number(1), "ping", Some(json!([1, 2])));
        assert_eq!(validate_request(&req).unwrap_err().code(), -32600);
        let req = JsonRpcRequest::new(RequestId::Number(1), "ping", Some(Value::Null));
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id(&json!({"id": 5})), Some(RequestId::Number(5)));
        assert_eq!(extract_id(&json!({"id": null})), Some(RequestId::Null));
        assert_eq!(extract_id(&json!({"method": "x"})), None);
    }
}
