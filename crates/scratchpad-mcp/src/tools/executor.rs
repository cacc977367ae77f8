//! Runs a tool call end to end: lookup, argument checks, authorization,
//! isolated execution, and classification of the outcome.

use std::any::Any;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::notifications::ProgressSink;
use crate::protocol::auth::{AllowAll, AuthHook};
use crate::session::{Session, SessionId, SessionTable};
use crate::store::SharedStore;
use crate::types::{
    error_codes, McpError, McpResult, ProgressToken, ToolCallResult, ToolContent,
};

use super::registry::ToolRegistry;
use super::schema;

/// Everything a tool body may touch.
#[derive(Clone)]
pub struct ToolContext {
    pub store: SharedStore,
    pub sessions: Arc<SessionTable>,
    pub session_id: SessionId,
    pub progress: ProgressSink,
}

impl ToolContext {
    /// Notify every session subscribed to `uri` that it changed.
    pub fn notify_resource_changed(&self, uri: &str) -> usize {
        self.sessions.broadcast_resource_updated(uri)
    }
}

/// How a tool call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success {
        content: Vec<ToolContent>,
        structured: Option<Value>,
    },
    /// The tool ran and reported a domain failure (`isError: true`).
    ToolError { content: Vec<ToolContent> },
    /// The call never produced a result.
    ProtocolError { code: i32, message: String },
}

impl ToolOutcome {
    pub fn from_error(err: &McpError) -> Self {
        ToolOutcome::ProtocolError {
            code: err.code(),
            message: err.client_message(),
        }
    }

    pub fn from_result(result: McpResult<ToolCallResult>) -> Self {
        match result {
            Ok(r) if r.is_error() => ToolOutcome::ToolError { content: r.content },
            Ok(r) => ToolOutcome::Success {
                content: r.content,
                structured: r.structured_content,
            },
            Err(e) => Self::from_error(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// Turn the outcome into the `tools/call` result or a protocol error.
    pub fn into_result(self) -> McpResult<ToolCallResult> {
        match self {
            ToolOutcome::Success {
                content,
                structured,
            } => Ok(ToolCallResult {
                content,
                is_error: None,
                structured_content: structured,
            }),
            ToolOutcome::ToolError { content } => Ok(ToolCallResult {
                content,
                is_error: Some(true),
                structured_content: None,
            }),
            ToolOutcome::ProtocolError { code, message } => {
                Err(McpError::Protocol { code, message })
            }
        }
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    store: SharedStore,
    sessions: Arc<SessionTable>,
    auth: Arc<dyn AuthHook>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, store: SharedStore, sessions: Arc<SessionTable>) -> Self {
        Self {
            registry,
            store,
            sessions,
            auth: Arc::new(AllowAll),
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthHook>) -> Self {
        self.auth = auth;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn execute(
        &self,
        name: &str,
        arguments: Option<Value>,
        session: &Session,
        progress_token: Option<ProgressToken>,
    ) -> ToolOutcome {
        let Some(tool) = self.registry.get(name) else {
            tracing::debug!("Unknown tool requested: {name}");
            return ToolOutcome::from_error(&McpError::ToolNotFound(name.to_string()));
        };

        let args = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(args) => args,
        };

        if let Some(definition) = self.registry.definition(name) {
            if let Err(violations) = schema::validate(&definition.input_schema, &args) {
                return ToolOutcome::from_error(&McpError::InvalidParams(schema::describe(
                    &violations,
                )));
            }
        }

        if self.registry.is_privileged(name)
            && !self.auth.is_authorized(name, session.credentials().as_ref())
        {
            return ToolOutcome::from_error(&McpError::Unauthorized(format!(
                "Not authorized to call tool '{name}'"
            )));
        }

        let ctx = ToolContext {
            store: Arc::clone(&self.store),
            sessions: Arc::clone(&self.sessions),
            session_id: session.id().clone(),
            progress: ProgressSink::new(session, progress_token),
        };

        tracing::debug!(session = %session.id(), tool = name, "Executing tool");
        let handle = tokio::spawn(async move { tool.call(args, &ctx).await });

        match handle.await {
            Ok(result) => {
                let outcome = ToolOutcome::from_result(result);
                if let ToolOutcome::ProtocolError { code, message } = &outcome {
                    tracing::debug!(tool = name, code, "Tool call failed: {message}");
                }
                outcome
            }
            Err(join_err) => {
                let detail = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    "task cancelled".to_string()
                };
                tracing::error!(tool = name, "Tool panicked: {detail}");
                ToolOutcome::ProtocolError {
                    code: error_codes::INTERNAL_ERROR,
                    message: format!("Internal error: tool '{name}' failed: {detail}"),
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::auth::{BearerTokenAuth, Credentials};
    use crate::store::shared_store;
    use crate::tools::registry::ToolHandler;
    use crate::types::ToolDefinition;
    use async_trait::async_trait;
    use serde_json::json;

    struct Boom;

    #[async_trait]
    impl ToolHandler for Boom {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "boom".to_string(),
                description: Some("Always panics".to_string()),
                input_schema: json!({"type": "object", "properties": {}}),
            }
        }

        async fn call(&self, _args: Value, _ctx: &ToolContext) -> McpResult<ToolCallResult> {
            panic!("kaboom");
        }
    }

    fn executor(registry: ToolRegistry) -> (ToolExecutor, Arc<SessionTable>) {
        let sessions = Arc::new(SessionTable::new());
        (
            ToolExecutor::new(Arc::new(registry), shared_store(), Arc::clone(&sessions)),
            sessions,
        )
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (exec, sessions) = executor(ToolRegistry::builtin(&[]));
        let session = sessions.create();
        let outcome = exec.execute("frobnicate", None, &session, None).await;
        assert_eq!(
            outcome,
            ToolOutcome::ProtocolError {
                code: -32602,
                message: "Unknown tool: frobnicate".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_schema_rejection_before_invocation() {
        let (exec, sessions) = executor(ToolRegistry::builtin(&[]));
        let session = sessions.create();
        let outcome = exec
            .execute("calculate", Some(json!({"operation": "add", "a": "x", "b": 1})), &session, None)
            .await;
        assert!(matches!(outcome, ToolOutcome::ProtocolError { code: -32602, .. }));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Boom), false);
        let (exec, sessions) = executor(registry);
        let session = sessions.create();
        match exec.execute("boom", None, &session, None).await {
            ToolOutcome::ProtocolError { code, message } => {
                assert_eq!(code, -32603);
                assert!(message.contains("kaboom"));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_privileged_tool_requires_auth() {
        let sessions = Arc::new(SessionTable::new());
        let exec = ToolExecutor::new(
            Arc::new(ToolRegistry::builtin(&["increment_counter".to_string()])),
            shared_store(),
            Arc::clone(&sessions),
        )
        .with_auth(Arc::new(BearerTokenAuth::new("secret")));
        let session = sessions.create();

        let denied = exec.execute("increment_counter", None, &session, None).await;
        assert!(matches!(denied, ToolOutcome::ProtocolError { code: -32900, .. }));

        session.set_credentials(Some(Credentials::bearer("secret")));
        let allowed = exec.execute("increment_counter", None, &session, None).await;
        assert!(allowed.is_success());
    }
}
