//! Shared helpers for integration tests: an MCP handler wired to a wiremock
//! console backend.

#![allow(dead_code)]

use console_mcp::client::{ClientConfig, ConsoleClient, Credentials};
use console_mcp::mcp::protocol::{JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use console_mcp::mcp::{McpHandler, ToolContext};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub fn client_for(server: &MockServer, credentials: Credentials) -> ConsoleClient {
    ConsoleClient::new(ClientConfig {
        base_url: server.uri(),
        credentials,
        timeout: 5,
        verbose: false,
    })
    .expect("client")
}

pub fn handler_for(server: &MockServer) -> McpHandler {
    handler_with(server, Credentials::Token("test-token".to_string()))
}

pub fn handler_with(server: &MockServer, credentials: Credentials) -> McpHandler {
    McpHandler::new(ToolContext::new(Arc::new(client_for(server, credentials))))
}

pub fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(JsonRpcId::Number(id)),
        method: method.to_string(),
        params,
    }
}

pub fn notification(method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest { jsonrpc: "2.0".to_string(), id: None, method: method.to_string(), params }
}

/// Send `tools/call` and return the tool result object
pub async fn call_tool(handler: &McpHandler, id: i64, name: &str, arguments: Value) -> Value {
    let response = handler
        .handle_request(request(id, "tools/call", json!({"name": name, "arguments": arguments})))
        .await
        .expect("tools/call always answers");
    result_of(response)
}

pub fn result_of(response: JsonRpcResponse) -> Value {
    match (response.result, response.error) {
        (Some(result), None) => result,
        (_, error) => panic!("expected a result, got error {:?}", error),
    }
}

/// First text block of a tool result
pub fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().expect("text content")
}

/// First text block parsed as JSON
pub fn json_text(result: &Value) -> Value {
    serde_json::from_str(text(result)).expect("JSON text content")
}
