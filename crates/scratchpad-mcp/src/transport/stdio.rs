//! Stdio transport: reads JSON-RPC from stdin, writes to stdout.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::notifications::{NotificationChannel, Push, DEFAULT_KEEPALIVE};
use crate::protocol::validator::is_notification_shaped;
use crate::protocol::ProtocolHandler;
use crate::types::{to_value, McpError, McpResult, RequestId};

use super::framing;

/// Stdio transport for desktop MCP clients. One connection, one session.
pub struct StdioTransport {
    handler: Arc<ProtocolHandler>,
    keepalive: Duration,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self::from_shared(Arc::new(handler))
    }

    pub fn from_shared(handler: Arc<ProtocolHandler>) -> Self {
        Self {
            handler,
            keepalive: DEFAULT_KEEPALIVE,
        }
    }

    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Run the transport loop: reads from stdin, writes to stdout.
    pub async fn run(&self) -> McpResult<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one client over any byte stream pair until the reader hits EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let session = self.handler.sessions().create();
        let (tx, rx) = mpsc::unbounded_channel::<Push>();
        let writer_task = tokio::spawn(write_loop(writer, rx));
        let channel = NotificationChannel::spawn(&session, tx.clone(), self.keepalive)?;

        tracing::info!(session = %session.id(), "Stdio transport started");

        let mut lines = BufReader::new(reader).lines();
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            tracing::info!("EOF on stdin, shutting down");
                            break;
                        }
                        Err(e) => {
                            tracing::error!("Failed to read stdin: {e}");
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    match framing::parse_value(&line) {
                        // Notifications apply before the next line is read, so
                        // `initialized` is in effect for the request behind it.
                        Ok(value) if !expects_reply(&value) => {
                            self.handler.handle_value(value, &session).await;
                        }
                        Ok(value) => {
                            let handler = Arc::clone(&self.handler);
                            let session = Arc::clone(&session);
                            let tx = tx.clone();
                            in_flight.spawn(async move {
                                if let Some(response) = handler.handle_value(value, &session).await {
                                    if tx.send(Push::Message(response)).is_err() {
                                        tracing::debug!("Response dropped: output closed");
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!("Parse error: {e}");
                            let error = to_value(&e.to_json_rpc_error(RequestId::Null));
                            if tx.send(Push::Message(error)).is_err() {
                                tracing::debug!("Parse error response dropped: output closed");
                            }
                        }
                    }
                }
                Some(done) = in_flight.join_next() => {
                    if let Err(e) = done {
                        tracing::error!("Request task failed: {e}");
                    }
                }
            }
        }

        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                tracing::error!("Request task failed: {e}");
            }
        }

        self.handler.sessions().teardown(session.id().as_str());
        channel.join().await;
        drop(tx);

        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(McpError::Transport(format!("stdout writer failed: {e}"))),
        }
    }
}

/// Single writer so responses and notifications never interleave mid-line.
/// Keep-alives carry no meaning on a pipe and are skipped.
async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Push>) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = rx.recv().await {
        let Push::Message(value) = item else {
            continue;
        };
        let framed = framing::frame_message(&value)?;
        writer
            .write_all(framed.as_bytes())
            .await
            .map_err(McpError::Io)?;
        writer.flush().await.map_err(McpError::Io)?;
    }
    Ok(())
}

/// Whether a raw message (or any element of a batch) is a request.
fn expects_reply(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty() || items.iter().any(expects_reply),
        other => !is_notification_shaped(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expects_reply() {
        assert!(expects_reply(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})));
        assert!(!expects_reply(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"})));
        assert!(!expects_reply(&json!([{"jsonrpc": "2.0", "method": "initialized"}])));
        assert!(expects_reply(&json!([
            {"jsonrpc": "2.0", "method": "initialized"},
            {"jsonrpc": "2.0", "id": 2, "method": "tools/list"}
        ])));
        assert!(expects_reply(&json!([])));
        assert!(expects_reply(&json!("not an object")));
    }
}
