//! HTTP + SSE transport integration tests, driven through the router directly.

#![cfg(feature = "sse")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tower::ServiceExt;

use scratchpad_mcp::protocol::ProtocolHandler;
use scratchpad_mcp::session::SessionTable;
use scratchpad_mcp::transport::SseTransport;
use scratchpad_mcp::{shared_store, ServerConfig};

// ─────────────────────── helpers ───────────────────────

fn app_with(config: ServerConfig) -> (Arc<ProtocolHandler>, Router) {
    let handler = Arc::new(ProtocolHandler::with_config(
        shared_store(),
        Arc::new(SessionTable::new()),
        &config,
    ));
    let router = SseTransport::new(Arc::clone(&handler), config).router();
    (handler, router)
}

fn app() -> (Arc<ProtocolHandler>, Router) {
    app_with(ServerConfig::default())
}

fn post(body: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(id) = session {
        builder = builder.header("x-session-id", id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_id(resp: &Response) -> String {
    resp.headers()["x-session-id"].to_str().unwrap().to_string()
}

fn init_body() -> String {
    json!({
        "jsonrpc": "2.0",
        "id": 0,
        "method": "initialize",
        "params": {"protocolVersion": "2024-11-05", "capabilities": {}}
    })
    .to_string()
}

/// Initialize a session over HTTP and return its id.
async fn handshake(router: &Router) -> String {
    let resp = router.clone().oneshot(post(&init_body(), None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let id = session_id(&resp);

    let resp = router
        .clone()
        .oneshot(post(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, Some(&id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    id
}

// ═══════════════════════════════════════════════════════

/// Test 1: health and readiness.
#[tokio::test]
async fn test_01_health_and_ready() {
    let (_handler, router) = app();
    let resp = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health = json_body(resp).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["sessions"], 0);

    let resp = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["ready"], true);

    println!("TEST 01 — Health And Ready: PASS");
}

/// Test 2: the session header correlates requests.
#[tokio::test]
async fn test_02_session_correlation() {
    let (handler, router) = app();
    let id = handshake(&router).await;
    assert_eq!(handler.sessions().len(), 1);

    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string();
    let resp = router.clone().oneshot(post(&body, Some(&id))).await.unwrap();
    assert_eq!(session_id(&resp), id);
    let list = json_body(resp).await;
    assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 6);

    // No header means a fresh, uninitialized session.
    let resp = router.oneshot(post(&body, None)).await.unwrap();
    assert_ne!(session_id(&resp), id);
    assert_eq!(json_body(resp).await["error"]["code"], -32602);

    println!("TEST 02 — Session Correlation: PASS");
}

/// Test 3: invalid JSON is a 400 with PARSE_ERROR.
#[tokio::test]
async fn test_03_parse_error() {
    let (_handler, router) = app();
    let resp = router.oneshot(post("{not json", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);

    println!("TEST 03 — Parse Error: PASS");
}

/// Test 4: bearer auth guards /mcp but not /health.
#[tokio::test]
async fn test_04_bearer_auth() {
    let config = ServerConfig {
        token: Some("secret".to_string()),
        ..ServerConfig::default()
    };
    let (_handler, router) = app_with(config);

    let resp = router.clone().oneshot(post(&init_body(), None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"]["code"], -32900);

    let resp = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut req = post(&init_body(), None);
    req.headers_mut()
        .insert("authorization", "Bearer secret".parse().unwrap());
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    println!("TEST 04 — Bearer Auth: PASS");
}

/// Test 5: DELETE tears the session down once.
#[tokio::test]
async fn test_05_delete_session() {
    let (handler, router) = app();
    let id = handshake(&router).await;

    let delete = |id: &str| {
        Request::builder()
            .method("DELETE")
            .uri("/mcp")
            .header("x-session-id", id)
            .body(Body::empty())
            .unwrap()
    };
    let resp = router.clone().oneshot(delete(&id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(handler.sessions().is_empty());

    let resp = router.oneshot(delete(&id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    println!("TEST 05 — Delete Session: PASS");
}

/// Test 6: the SSE stream opens with a connection event and carries notifications.
#[tokio::test]
async fn test_06_sse_stream() {
    let (_handler, router) = app();
    let id = handshake(&router).await;

    let sse = |id: &str| {
        Request::get("/mcp/sse")
            .header("x-session-id", id)
            .body(Body::empty())
            .unwrap()
    };
    let resp = router.clone().oneshot(sse(&id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    let mut stream = resp.into_body().into_data_stream();

    let first = stream.next().await.unwrap().unwrap();
    let first = String::from_utf8_lossy(&first);
    assert!(first.contains("event: connection"), "{first}");
    assert!(first.contains(&id));

    // Only one stream per session.
    let resp = router.clone().oneshot(sse(&id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let subscribe = json!({"jsonrpc": "2.0", "id": 1, "method": "resources/subscribe", "params": {"uri": "server://notes"}});
    router.clone().oneshot(post(&subscribe.to_string(), Some(&id))).await.unwrap();
    let call = json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "add_note", "arguments": {"content": "hello"}}});
    router.oneshot(post(&call.to_string(), Some(&id))).await.unwrap();

    let next = stream.next().await.unwrap().unwrap();
    let next = String::from_utf8_lossy(&next);
    assert!(next.contains("event: message"), "{next}");
    assert!(next.contains("notifications/resources/updated"));
    assert!(next.contains("server://notes"));

    println!("TEST 06 — SSE Stream: PASS");
}
