//! Main request dispatcher: receives JSON-RPC messages, routes to handlers.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ServerConfig;
use crate::logging::LogLevelControl;
use crate::prompts::{completion, PromptRegistry};
use crate::resources::{ResourceContext, ResourceRegistry};
use crate::session::{Session, SessionTable};
use crate::store::SharedStore;
use crate::tools::{ToolExecutor, ToolRegistry};
use crate::types::*;

use super::auth::{AllowAll, AuthHook, BearerTokenAuth};
use super::method::{ClientNotification, Method};
use super::negotiation::Negotiator;
use super::validator::{extract_id, is_notification_shaped, validate_request};

/// The main protocol handler that dispatches incoming JSON-RPC messages.
///
/// One handler serves every session; per-session state lives on [`Session`].
pub struct ProtocolHandler {
    store: SharedStore,
    sessions: Arc<SessionTable>,
    executor: ToolExecutor,
    negotiator: Negotiator,
    server_info: Implementation,
    log_control: Option<Arc<dyn LogLevelControl>>,
}

impl ProtocolHandler {
    pub fn new(store: SharedStore, sessions: Arc<SessionTable>) -> Self {
        Self::with_config(store, sessions, &ServerConfig::default())
    }

    pub fn with_config(store: SharedStore, sessions: Arc<SessionTable>, config: &ServerConfig) -> Self {
        let registry = Arc::new(ToolRegistry::builtin(&config.privileged_tools));
        let auth: Arc<dyn AuthHook> = match &config.token {
            Some(token) => Arc::new(BearerTokenAuth::new(token.clone())),
            None => Arc::new(AllowAll),
        };
        let executor = ToolExecutor::new(registry, Arc::clone(&store), Arc::clone(&sessions))
            .with_auth(auth);
        let server_info = config.server_info();

        Self {
            store,
            sessions,
            executor,
            negotiator: Negotiator::new(
                server_info.clone(),
                config.required_client_capabilities.clone(),
            ),
            server_info,
            log_control: None,
        }
    }

    pub fn with_auth_hook(mut self, auth: Arc<dyn AuthHook>) -> Self {
        self.executor = self.executor.with_auth(auth);
        self
    }

    pub fn with_log_control(mut self, control: Arc<dyn LogLevelControl>) -> Self {
        self.log_control = Some(control);
        self
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn server_info(&self) -> &Implementation {
        &self.server_info
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        self.executor.registry()
    }

    /// Handle one raw inbound JSON value: a single envelope or a batch.
    ///
    /// Returns `None` when nothing should be sent back.
    pub async fn handle_value(&self, value: Value, session: &Arc<Session>) -> Option<Value> {
        match value {
            Value::Array(items) if items.is_empty() => Some(error_value(
                RequestId::Null,
                &McpError::InvalidRequest("Empty batch".to_string()),
            )),
            Value::Array(items) => {
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(response) = self.handle_single(item, session).await {
                        responses.push(response);
                    }
                }
                if responses.is_empty() {
                    None
                } else {
                    Some(Value::Array(responses))
                }
            }
            other => self.handle_single(other, session).await,
        }
    }

    async fn handle_single(&self, value: Value, session: &Arc<Session>) -> Option<Value> {
        if !value.is_object() {
            return Some(error_value(
                RequestId::Null,
                &McpError::InvalidRequest("Message must be a JSON object".to_string()),
            ));
        }

        match serde_json::from_value::<JsonRpcMessage>(value.clone()) {
            Ok(msg) => self.handle_message(msg, session).await,
            Err(e) if is_notification_shaped(&value) => {
                tracing::debug!("Dropping malformed notification: {e}");
                None
            }
            Err(e) => Some(error_value(
                extract_id(&value).unwrap_or(RequestId::Null),
                &McpError::InvalidRequest(e.to_string()),
            )),
        }
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage, session: &Arc<Session>) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req, session).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif, session);
                None
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => {
                tracing::debug!(session = %session.id(), "Ignoring response envelope from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest, session: &Arc<Session>) -> Value {
        let id = request.id.clone();
        let method = request.method.clone();

        match self.process_request(request, session).await {
            Ok(result) => message::to_value(&JsonRpcResponse::new(id, result)),
            Err(e) => {
                if e.code() == error_codes::INTERNAL_ERROR {
                    tracing::error!(session = %session.id(), method = %method, "Request failed: {e}");
                } else {
                    tracing::debug!(session = %session.id(), method = %method, "Request rejected: {e}");
                }
                error_value(id, &e)
            }
        }
    }

    async fn process_request(&self, request: JsonRpcRequest, session: &Arc<Session>) -> McpResult<Value> {
        validate_request(&request)?;

        if session.is_closed() {
            return Err(McpError::SessionClosed(session.id().to_string()));
        }
        session.touch();

        let method = Method::parse(&request.method)
            .ok_or_else(|| McpError::MethodNotFound(request.method.clone()))?;

        if !method.allowed_before_initialized() && !session.is_initialized() {
            return Err(McpError::NotInitialized);
        }

        tracing::debug!(session = %session.id(), method = method.as_str(), "Handling request");
        self.dispatch(method, request.params, session).await
    }

    async fn dispatch(&self, method: Method, params: Option<Value>, session: &Arc<Session>) -> McpResult<Value> {
        match method {
            Method::Initialize => self.handle_initialize(params, session),
            Method::Initialized => {
                session.mark_initialized()?;
                Ok(empty_object())
            }
            Method::Ping => Ok(empty_object()),

            Method::ToolsList => to_result(&ToolListResult {
                tools: self.tools().list_tools(),
                next_cursor: None,
            }),
            Method::ToolsCall => self.handle_tools_call(params, session).await,

            Method::ResourcesList => to_result(&ResourceListResult {
                resources: ResourceRegistry::list_resources(),
                next_cursor: None,
            }),
            Method::ResourceTemplatesList => to_result(&ResourceTemplateListResult {
                resource_templates: ResourceRegistry::list_templates(),
                next_cursor: None,
            }),
            Method::ResourcesRead => self.handle_resources_read(params).await,
            Method::ResourcesSubscribe => self.handle_subscribe(params, session),
            Method::ResourcesUnsubscribe => {
                let p: ResourceSubscribeParams = parse_params(params, "Resource uri required")?;
                session.unsubscribe(&p.uri);
                Ok(empty_object())
            }

            Method::PromptsList => to_result(&PromptListResult {
                prompts: PromptRegistry::list_prompts(),
                next_cursor: None,
            }),
            Method::PromptsGet => {
                let p: PromptGetParams = parse_params(params, "Prompt get params required")?;
                to_result(&PromptRegistry::get(&p.name, p.arguments, &self.store).await?)
            }

            Method::LoggingSetLevel => self.handle_set_level(params, session),
            Method::CompletionComplete => {
                let p: CompleteParams = parse_params(params, "Completion params required")?;
                to_result(&completion::complete(&p, &self.store).await?)
            }
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification, session: &Arc<Session>) {
        match ClientNotification::parse(&notification.method) {
            Some(ClientNotification::Initialized) => {
                if let Err(e) = session.mark_initialized() {
                    tracing::warn!(session = %session.id(), "Dropping initialized notification: {e}");
                } else {
                    tracing::info!(session = %session.id(), "Session fully initialized");
                }
            }
            Some(ClientNotification::Cancelled) => {
                tracing::info!(session = %session.id(), "Received cancellation notification");
            }
            None => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_initialize(&self, params: Option<Value>, session: &Arc<Session>) -> McpResult<Value> {
        let init: InitializeParams = parse_params(params, "Initialize params required")?;
        let result = self.negotiator.negotiate(&init)?;
        session.begin(init.protocol_version, init.client_info, init.capabilities)?;
        to_result(&result)
    }

    async fn handle_tools_call(&self, params: Option<Value>, session: &Arc<Session>) -> McpResult<Value> {
        let call: ToolCallParams = parse_params(params, "Tool call params required")?;
        let token = call.meta.and_then(|m| m.progress_token);
        let result = self
            .executor
            .execute(&call.name, call.arguments, session, token)
            .await
            .into_result()?;
        to_result(&result)
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> McpResult<Value> {
        let read: ResourceReadParams = parse_params(params, "Resource read params required")?;
        let ctx = ResourceContext {
            store: &self.store,
            sessions: &self.sessions,
            server_info: &self.server_info,
        };
        to_result(&ResourceRegistry::read(&read.uri, &ctx).await?)
    }

    fn handle_subscribe(&self, params: Option<Value>, session: &Arc<Session>) -> McpResult<Value> {
        let p: ResourceSubscribeParams = parse_params(params, "Resource uri required")?;
        if ResourceRegistry::contains(&p.uri) {
            session.subscribe(&p.uri);
            tracing::debug!(session = %session.id(), uri = %p.uri, "Subscribed");
        } else {
            tracing::warn!(session = %session.id(), uri = %p.uri, "Subscription to non-catalog resource not recorded");
        }
        Ok(empty_object())
    }

    fn handle_set_level(&self, params: Option<Value>, session: &Arc<Session>) -> McpResult<Value> {
        let p: SetLevelParams = parse_params(params, "Log level required")?;
        let level: LogLevel = p.level.parse()?;
        session.set_log_level(level);
        if let Some(control) = &self.log_control {
            control.set_level(level)?;
        }
        tracing::info!(session = %session.id(), %level, "Log level changed");
        Ok(empty_object())
    }
}

/// Deserialize request params, treating absence as an error.
fn parse_params<T: DeserializeOwned>(params: Option<Value>, missing: &str) -> McpResult<T> {
    params
        .filter(|p| !p.is_null())
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(missing.to_string()))
}

fn to_result<T: Serialize>(value: &T) -> McpResult<Value> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn error_value(id: RequestId, err: &McpError) -> Value {
    message::to_value(&err.to_json_rpc_error(id))
}
