//! SSE transport: HTTP POST for requests, a Server-Sent Events stream for
//! notifications, plus /health and /ready.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{
        sse::{Event, Sse},
        IntoResponse, Json as AxumJson, Response,
    },
    routing::{get, post},
    Router,
};
use serde_json::json;
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::notifications::{NotificationChannel, Push};
use crate::protocol::{Credentials, ProtocolHandler};
use crate::session::Session;
use crate::types::{to_value, McpError, McpResult, RequestId};

use super::framing;

/// Header carrying the session token in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub handler: Arc<ProtocolHandler>,
    pub token: Option<String>,
    pub keepalive: Duration,
}

/// SSE transport for web-based MCP clients.
pub struct SseTransport {
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl SseTransport {
    pub fn new(handler: Arc<ProtocolHandler>, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(ServerState {
                handler,
                token: config.token.clone(),
                keepalive: config.keepalive,
            }),
            config,
        }
    }

    /// The full route table. /health and /ready bypass the auth layer.
    pub fn router(&self) -> Router {
        let state = Arc::clone(&self.state);

        Router::new()
            .route("/mcp", post(handle_post).delete(handle_delete))
            .route("/mcp/sse", get(handle_sse))
            .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
            .route("/health", get(handle_health))
            .route("/ready", get(handle_ready))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(state)
    }

    /// Run the HTTP server until Ctrl-C, then close every session.
    pub async fn run(&self) -> McpResult<()> {
        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(McpError::Io)?;

        let sessions = Arc::clone(self.state.handler.sessions());
        let stop_reaper = Arc::new(Notify::new());
        let reaper = sessions.spawn_reaper(
            self.config.reaper_interval,
            self.config.session_idle_timeout,
            Arc::clone(&stop_reaper),
        );

        tracing::info!("HTTP transport listening on {addr}");

        let closing = Arc::clone(&sessions);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {e}");
                    std::future::pending::<()>().await;
                }
                tracing::info!("Shutdown signal received");
                // Ends open SSE streams so the server can drain.
                closing.teardown_all();
            })
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        stop_reaper.notify_one();
        if let Err(e) = reaper.await {
            tracing::warn!("Session reaper ended abnormally: {e}");
        }
        let closed = sessions.teardown_all();
        tracing::info!(closed, "HTTP transport stopped");
        Ok(())
    }
}

/// Auth middleware: checks Bearer token if configured.
async fn auth_layer(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: middleware::Next,
) -> Response {
    if let Some(expected) = &state.token {
        let authorized = bearer_credentials(&headers)
            .and_then(|c| c.bearer_token)
            .is_some_and(|token| &token == expected);

        if !authorized {
            return error_response(
                StatusCode::UNAUTHORIZED,
                &McpError::Unauthorized("missing or invalid bearer token".to_string()),
            );
        }
    }

    next.run(request).await
}

/// Handle JSON-RPC requests. The session is keyed by the X-Session-ID header.
async fn handle_post(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let session = session_for(&state, &headers);
    if let Some(credentials) = bearer_credentials(&headers) {
        session.set_credentials(Some(credentials));
    }

    let value = match framing::parse_value(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(session = %session.id(), "Parse error: {e}");
            return with_session_header(error_response(StatusCode::BAD_REQUEST, &e), &session);
        }
    };

    let response = match state.handler.handle_value(value, &session).await {
        Some(reply) => AxumJson(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    with_session_header(response, &session)
}

/// Open the notification stream for a session.
async fn handle_sse(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let session = session_for(&state, &headers);
    let (tx, rx) = mpsc::unbounded_channel::<Push>();

    if let Err(e) = NotificationChannel::spawn(&session, tx, state.keepalive) {
        let status = match e {
            McpError::SessionClosed(_) => StatusCode::GONE,
            _ => StatusCode::CONFLICT,
        };
        return error_response(status, &e);
    }

    tracing::info!(session = %session.id(), "SSE stream opened");

    let connected = Event::default()
        .event("connection")
        .data(json!({ "sessionId": session.id().as_str() }).to_string());
    let events = UnboundedReceiverStream::new(rx).map(|push| {
        Ok::<_, Infallible>(match push {
            Push::Message(value) => Event::default().event("message").data(value.to_string()),
            Push::KeepAlive => Event::default().event("ping").data("{}"),
        })
    });
    let stream = tokio_stream::once(Ok(connected)).chain(events);

    with_session_header(Sse::new(stream).into_response(), &session)
}

/// Explicit session teardown.
async fn handle_delete(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> StatusCode {
    let Some(id) = session_header(&headers) else {
        return StatusCode::BAD_REQUEST;
    };
    if state.handler.sessions().teardown(id) {
        tracing::info!(session = id, "Session deleted by client");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Health check endpoint: no auth required.
async fn handle_health(State(state): State<Arc<ServerState>>) -> AxumJson<serde_json::Value> {
    let info = state.handler.server_info();
    AxumJson(json!({
        "status": "healthy",
        "server": info.name,
        "version": info.version,
        "sessions": state.handler.sessions().len(),
    }))
}

async fn handle_ready() -> AxumJson<serde_json::Value> {
    AxumJson(json!({ "ready": true }))
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn bearer_credentials(headers: &HeaderMap) -> Option<Credentials> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(Credentials::from_authorization_header)
}

fn session_for(state: &ServerState, headers: &HeaderMap) -> Arc<Session> {
    state
        .handler
        .sessions()
        .get_or_create(session_header(headers))
}

fn with_session_header(mut response: Response, session: &Session) -> Response {
    if let Ok(value) = HeaderValue::from_str(session.id().as_str()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn error_response(status: StatusCode, err: &McpError) -> Response {
    let body = to_value(&err.to_json_rpc_error(RequestId::Null));
    (status, AxumJson(body)).into_response()
}
