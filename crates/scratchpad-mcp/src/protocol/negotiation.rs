//! MCP capability negotiation during initialization.

use chrono::NaiveDate;

use crate::types::{
    Implementation, InitializeParams, InitializeResult, McpError, McpResult, MCP_VERSION,
};

/// Validates `initialize` requests and builds the server's answer.
#[derive(Debug, Clone)]
pub struct Negotiator {
    server_info: Implementation,
    required_capabilities: Vec<String>,
}

impl Negotiator {
    pub fn new(server_info: Implementation, required_capabilities: Vec<String>) -> Self {
        Self {
            server_info,
            required_capabilities,
        }
    }

    pub fn negotiate(&self, params: &InitializeParams) -> McpResult<InitializeResult> {
        parse_protocol_version(&params.protocol_version)?;

        let missing: Vec<&str> = self
            .required_capabilities
            .iter()
            .filter(|name| !params.capabilities.has(name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(McpError::InvalidParams(format!(
                "Missing required client capabilities: {}",
                missing.join(", ")
            )));
        }

        if params.protocol_version != MCP_VERSION {
            tracing::warn!(
                "Client requested protocol version {}, server supports {}. Proceeding with server version.",
                params.protocol_version,
                MCP_VERSION
            );
        }

        let client = params.client_info.clone().unwrap_or_default();
        tracing::info!("Initialized with client: {} v{}", client.name, client.version);

        Ok(InitializeResult::for_server(self.server_info.clone()))
    }
}

/// Protocol versions are dates (`YYYY-MM-DD`).
pub fn parse_protocol_version(version: &str) -> McpResult<NaiveDate> {
    NaiveDate::parse_from_str(version, "%Y-%m-%d").map_err(|_| {
        McpError::InvalidParams(format!("Invalid protocol version: {version}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientCapabilities;
    use serde_json::json;

    fn params(version: &str, caps: serde_json::Value) -> InitializeParams {
        InitializeParams {
            protocol_version: version.to_string(),
            capabilities: serde_json::from_value::<ClientCapabilities>(caps).unwrap(),
            client_info: None,
        }
    }

    #[test]
    fn test_rejects_malformed_version() {
        let negotiator = Negotiator::new(Implementation::default(), Vec::new());
        let err = negotiator.negotiate(&params("latest", json!({}))).unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn test_other_date_versions_accepted() {
        let negotiator = Negotiator::new(Implementation::default(), Vec::new());
        let result = negotiator.negotiate(&params("2025-03-26", json!({}))).unwrap();
        assert_eq!(result.protocol_version, MCP_VERSION);
    }

    #[test]
    fn test_required_capabilities() {
        let negotiator = Negotiator::new(Implementation::default(), vec!["roots".to_string()]);
        assert!(negotiator
            .negotiate(&params("2024-11-05", json!({"sampling": {}})))
            .is_err());
        assert!(negotiator
            .negotiate(&params("2024-11-05", json!({"roots": {"listChanged": true}})))
            .is_ok());
    }
}
