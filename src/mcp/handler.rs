//! MCP Request Handler
//!
//! Routes incoming JSON-RPC requests to the appropriate method handlers.
//! The handler is shared between concurrently running requests, so all of its
//! state is behind `&self`.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::mcp::cancellation::CancellationManager;
use crate::mcp::error::McpError;
use crate::mcp::protocol::*;
use crate::mcp::tools::{self, ToolContext};

const SERVER_NAME: &str = "console-mcp";

const INSTRUCTIONS: &str = "Tools for a console platform. Start with list_tenants and list_projects to find ids. \
Read a configuration with get_configuration before changing it. create_service_from_marketplace never overwrites \
an existing service. deploy_pipeline can wait for the pipeline to finish.";

/// Negotiate MCP protocol version
///
/// Picks the highest version we support that is <= the client's version.
fn negotiate_version(client_version: &str) -> Result<String, McpError> {
    SUPPORTED_VERSIONS.iter().rev().find(|&&v| v <= client_version).map(|v| v.to_string()).ok_or_else(
        || McpError::UnsupportedProtocolVersion {
            client: client_version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        },
    )
}

pub struct McpHandler {
    tools: ToolContext,
    cancellations: CancellationManager,
    initialized: AtomicBool,
}

impl McpHandler {
    pub fn new(tools: ToolContext) -> Self {
        Self {
            tools,
            cancellations: CancellationManager::new(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Cancel every in-flight request, e.g. once the client has gone away
    pub fn cancel_all(&self) {
        self.cancellations.cancel_all();
    }

    /// Handle an incoming JSON-RPC message.
    ///
    /// Returns `None` for notifications (messages without an id).
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let method = request.method.clone();
        let id = request.id.clone();

        debug!(method = %method, id = ?id, "Handling MCP request");

        let response = if request.jsonrpc != JSONRPC_VERSION {
            self.error_response(
                id.clone(),
                McpError::InvalidRequest(format!("Unsupported jsonrpc version '{}'", request.jsonrpc)),
            )
        } else {
            match method.as_str() {
                "initialize" => self.handle_initialize(id.clone(), request.params),
                "notifications/initialized" | "initialized" => self.handle_initialized(id.clone()),
                "ping" => JsonRpcResponse::success(id.clone(), serde_json::json!({})),
                "tools/list" => self.handle_tools_list(id.clone()),
                "tools/call" => self.handle_tools_call(id.clone(), request.params).await,
                "notifications/cancelled" => self.handle_cancelled(id.clone(), request.params),
                _ => self.method_not_found(id.clone(), &method),
            }
        };

        debug!(
            method = %method,
            id = ?id,
            has_error = response.error.is_some(),
            "Completed MCP request"
        );

        id.map(|_| response)
    }

    fn handle_initialize(&self, id: Option<JsonRpcId>, params: Value) -> JsonRpcResponse {
        let params: InitializeRequest = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Failed to parse initialize params");
                return self.error_response(
                    id,
                    McpError::InvalidParams(format!("Failed to parse initialize params: {}", e)),
                );
            }
        };

        let client_version = if params.protocol_version.is_empty() {
            SUPPORTED_VERSIONS[0]
        } else {
            params.protocol_version.as_str()
        };

        let negotiated_version = match negotiate_version(client_version) {
            Ok(v) => v,
            Err(e) => {
                error!(client_version = %client_version, error = %e, "Protocol version negotiation failed");
                return self.error_response(id, e);
            }
        };

        info!(
            client_name = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol_version = %negotiated_version,
            "MCP client connected"
        );

        let result = InitializeResponse {
            protocol_version: negotiated_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: Some(false) }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                title: Some("Console MCP Server".to_string()),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        self.to_response(id, result)
    }

    fn handle_initialized(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        debug!("Received initialized notification");
        self.initialized.store(true, Ordering::SeqCst);
        JsonRpcResponse::success(id, serde_json::json!({}))
    }

    fn handle_tools_list(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        debug!("Listing available tools");
        self.to_response(id, ToolsListResult { tools: tools::get_all_tools(), next_cursor: None })
    }

    async fn handle_tools_call(&self, id: Option<JsonRpcId>, params: Value) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Failed to parse tool call params");
                return self.error_response(
                    id,
                    McpError::InvalidParams(format!("Failed to parse tool call params: {}", e)),
                );
            }
        };

        if !self.is_initialized() {
            warn!(tool_name = %params.name, "Tool called before initialization completed");
        }
        debug!(tool_name = %params.name, "Executing tool call");

        let args = params.arguments.unwrap_or_else(|| serde_json::json!({}));
        let registration = id.as_ref().map(|request_id| {
            (request_id, self.cancellations.register(request_id.clone()))
        });
        let cancel = match &registration {
            Some((_, registered)) => registered.token.clone(),
            None => CancellationToken::new(),
        };

        let result = tools::execute_tool(&self.tools, &params.name, args, &cancel).await;

        if let Some((request_id, registered)) = &registration {
            self.cancellations.complete(request_id, registered);
        }

        match result {
            Ok(tool_result) => self.to_response(id, tool_result),
            Err(e) => {
                error!(tool_name = %params.name, error = %e, "Tool execution failed");
                self.error_response(id, e)
            }
        }
    }

    fn handle_cancelled(&self, id: Option<JsonRpcId>, params: Value) -> JsonRpcResponse {
        match serde_json::from_value::<CancelledParams>(params) {
            Ok(params) => {
                let found = self.cancellations.cancel(&params.request_id);
                info!(
                    request_id = ?params.request_id,
                    reason = ?params.reason,
                    found,
                    "Client cancelled request"
                );
            }
            Err(e) => warn!(error = %e, "Ignoring malformed cancellation notification"),
        }
        JsonRpcResponse::success(id, serde_json::json!({}))
    }

    fn to_response<T: serde::Serialize>(&self, id: Option<JsonRpcId>, result: T) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => self.error_response(id, McpError::SerializationError(e)),
        }
    }

    fn method_not_found(&self, id: Option<JsonRpcId>, method: &str) -> JsonRpcResponse {
        warn!(method = %method, "Method not found");
        self.error_response(id, McpError::MethodNotFound(method.to_string()))
    }

    fn error_response(&self, id: Option<JsonRpcId>, error: McpError) -> JsonRpcResponse {
        JsonRpcResponse::failure(id, error.to_json_rpc_error())
    }
}
