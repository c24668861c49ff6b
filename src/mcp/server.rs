//! MCP Stdio Server
//!
//! Implements the stdio transport for MCP: reads JSON-RPC messages from stdin
//! (one per line) and writes responses to stdout.
//!
//! Requests are handled concurrently so that a `notifications/cancelled` can
//! reach a tool call that is still waiting on a pipeline. Responses are
//! funnelled through a single writer task and may arrive out of order.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::mcp::error::McpError;
use crate::mcp::handler::McpHandler;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};

pub struct McpStdioServer {
    handler: Arc<McpHandler>,
}

impl McpStdioServer {
    pub fn new(handler: McpHandler) -> Self {
        Self { handler: Arc::new(handler) }
    }

    /// Run the stdio server until stdin is closed
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Starting MCP stdio server");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve line-delimited JSON-RPC from `input`, writing responses to `output`.
    ///
    /// On EOF every in-flight request is cancelled and its response flushed
    /// before returning.
    pub async fn serve<R, W>(&self, input: R, output: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer = tokio::spawn(write_responses(rx, output));

        let mut lines = BufReader::new(input).lines();
        let mut in_flight = JoinSet::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            debug!(line = %line, "Received input line");

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    warn!(error = %e, "Failed to parse JSON-RPC request");
                    let error = McpError::ParseError(e.to_string());
                    if tx.send(JsonRpcResponse::failure(None, error.to_json_rpc_error())).is_err() {
                        break;
                    }
                    continue;
                }
            };

            let handler = self.handler.clone();
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = handler.handle_request(request).await {
                    if tx.send(response).is_err() {
                        debug!("Response writer closed, dropping response");
                    }
                }
            });

            while in_flight.try_join_next().is_some() {}
        }

        info!(in_flight = in_flight.len(), "MCP stdio server shutting down (EOF received)");

        self.handler.cancel_all();
        while in_flight.join_next().await.is_some() {}
        drop(tx);

        writer.await?
    }
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
    mut output: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let json = serde_json::to_string(&response)?;
        debug!(response = %json, "Writing response");

        output.write_all(json.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}
