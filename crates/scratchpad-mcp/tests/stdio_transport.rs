//! Stdio transport integration tests over in-memory pipes.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::task::JoinHandle;

use scratchpad_mcp::protocol::ProtocolHandler;
use scratchpad_mcp::session::SessionTable;
use scratchpad_mcp::shared_store;
use scratchpad_mcp::transport::StdioTransport;
use scratchpad_mcp::types::McpResult;

// ─────────────────────── helpers ───────────────────────

struct Client {
    writer: DuplexStream,
    reader: Lines<BufReader<DuplexStream>>,
}

impl Client {
    async fn write_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn send(&mut self, msg: Value) {
        self.write_line(&msg.to_string()).await;
    }

    async fn recv(&mut self) -> Value {
        let line = self.reader.next_line().await.unwrap().expect("server closed output");
        serde_json::from_str(&line).unwrap()
    }
}

/// Start a transport over duplex pipes and hand back the client ends.
fn start() -> (Arc<ProtocolHandler>, Client, JoinHandle<McpResult<()>>) {
    let handler = Arc::new(ProtocolHandler::new(shared_store(), Arc::new(SessionTable::new())));
    let transport = StdioTransport::from_shared(Arc::clone(&handler));

    let (client_writer, server_reader) = tokio::io::duplex(64 * 1024);
    let (server_writer, client_reader) = tokio::io::duplex(64 * 1024);
    let server = tokio::spawn(async move { transport.serve(server_reader, server_writer).await });

    let client = Client {
        writer: client_writer,
        reader: BufReader::new(client_reader).lines(),
    };
    (handler, client, server)
}

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

async fn handshake(client: &mut Client) {
    client
        .send(mcp_request(0, "initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}})))
        .await;
    let resp = client.recv().await;
    assert_eq!(resp["id"], 0);
    assert!(resp.get("result").is_some(), "{resp}");
    client
        .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;
}

// ═══════════════════════════════════════════════════════

/// Test 1: a full exchange, then EOF tears the session down.
#[tokio::test]
async fn test_01_exchange_and_eof() {
    let (handler, mut client, server) = start();
    handshake(&mut client).await;

    client.send(mcp_request(1, "tools/list", json!({}))).await;
    let resp = client.recv().await;
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["result"]["tools"].as_array().unwrap().len(), 6);
    assert_eq!(handler.sessions().len(), 1);

    drop(client);
    server.await.unwrap().unwrap();
    assert!(handler.sessions().is_empty());

    println!("TEST 01 — Exchange And EOF: PASS");
}

/// Test 2: unparsable lines get a PARSE_ERROR with a null id; blank lines are skipped.
#[tokio::test]
async fn test_02_parse_error() {
    let (_handler, mut client, _server) = start();

    client.write_line("").await;
    client.write_line(r#"{"broken":"#).await;
    let resp = client.recv().await;
    assert_eq!(resp["error"]["code"], -32700);
    assert_eq!(resp["id"], Value::Null);

    // The stream is still usable afterwards.
    handshake(&mut client).await;

    println!("TEST 02 — Parse Error: PASS");
}

/// Test 3: notifications are written on the same stream as responses.
#[tokio::test]
async fn test_03_notifications_on_stdout() {
    let (_handler, mut client, _server) = start();
    handshake(&mut client).await;

    client
        .send(mcp_request(1, "resources/subscribe", json!({"uri": "server://counter"})))
        .await;
    assert_eq!(client.recv().await["id"], 1);

    client
        .send(mcp_request(2, "tools/call", json!({"name": "increment_counter", "arguments": {"amount": 2}})))
        .await;

    let first = client.recv().await;
    let second = client.recv().await;
    let (response, notification) = if first.get("id").is_some() {
        (first, second)
    } else {
        (second, first)
    };
    assert_eq!(response["result"]["structuredContent"]["counter"], 2);
    assert_eq!(notification["method"], "notifications/resources/updated");
    assert_eq!(notification["params"]["uri"], "server://counter");
    assert!(notification.get("id").is_none());

    println!("TEST 03 — Notifications On Stdout: PASS");
}

/// Test 4: batches come back as one array line.
#[tokio::test]
async fn test_04_batch_line() {
    let (_handler, mut client, _server) = start();
    handshake(&mut client).await;

    client
        .send(json!([
            mcp_request(1, "ping", json!({})),
            mcp_request(2, "resources/read", json!({"uri": "server://counter"})),
        ]))
        .await;
    let resp = client.recv().await;
    let items = resp.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|r| r["result"]["contents"][0]["text"] == "0"));

    println!("TEST 04 — Batch Line: PASS");
}

/// Test 5: `initialized` and the first request written together always succeed,
/// even on a multi-threaded runtime.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_05_pipelined_handshake() {
    for round in 0..100 {
        let (_handler, mut client, _server) = start();
        client
            .send(mcp_request(0, "initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}})))
            .await;
        assert!(client.recv().await.get("result").is_some());

        let initialized = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let list = mcp_request(1, "tools/list", json!({}));
        client
            .write_line(&format!("{initialized}\n{list}"))
            .await;

        let resp = client.recv().await;
        assert_eq!(resp["id"], 1);
        assert!(
            resp.get("result").is_some(),
            "tools/list rejected in round {round}: {resp}"
        );
    }

    println!("TEST 05 — Pipelined Handshake: PASS");
}
