//! MCP Tools Module
//!
//! Console tools exposed over MCP. Each submodule pairs `xxx_tool()` (the
//! definition served by `tools/list`) with `execute_xxx()` (the `tools/call`
//! implementation).
//!
//! Backend failures are reported as tool results with `isError: true` so the
//! agent can read them; malformed arguments are JSON-RPC `InvalidParams`.

use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::client::ConsoleClient;
use crate::domain::ConfigurationRef;
use crate::errors::ConsoleError;
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::services::{ConfigurationMerger, DeployPipelineWatcher};

pub mod configuration;
pub mod deploy;
pub mod marketplace;
pub mod projects;
pub mod runtime;
pub mod tenants;

pub use configuration::{execute_get_configuration, get_configuration_tool};
pub use deploy::{
    deploy_pipeline_tool, execute_deploy_pipeline, execute_get_pipeline_status,
    get_pipeline_status_tool,
};
pub use marketplace::{
    create_service_from_marketplace_tool, execute_create_service_from_marketplace,
    execute_list_marketplace, list_marketplace_tool,
};
pub use projects::{
    execute_get_project, execute_list_projects, execute_list_revisions, get_project_tool,
    list_projects_tool, list_revisions_tool,
};
pub use runtime::{execute_get_pod_logs, execute_list_pods, get_pod_logs_tool, list_pods_tool};
pub use tenants::{execute_list_tenants, list_tenants_tool};

/// Collaborators shared by every tool call
pub struct ToolContext {
    pub client: Arc<ConsoleClient>,
    pub merger: ConfigurationMerger,
    pub watcher: DeployPipelineWatcher,
}

impl ToolContext {
    pub fn new(client: Arc<ConsoleClient>) -> Self {
        Self {
            merger: ConfigurationMerger::new(client.clone()),
            watcher: DeployPipelineWatcher::new(client.clone()),
            client,
        }
    }
}

/// Get all available MCP tools.
pub fn get_all_tools() -> Vec<Tool> {
    vec![
        list_tenants_tool(),
        list_projects_tool(),
        get_project_tool(),
        list_revisions_tool(),
        get_configuration_tool(),
        list_marketplace_tool(),
        create_service_from_marketplace_tool(),
        deploy_pipeline_tool(),
        get_pipeline_status_tool(),
        list_pods_tool(),
        get_pod_logs_tool(),
    ]
}

/// Execute a tool by name.
///
/// `cancel` fires when the client sends `notifications/cancelled` for the
/// request driving this call.
pub async fn execute_tool(
    ctx: &ToolContext,
    tool_name: &str,
    args: Value,
    cancel: &CancellationToken,
) -> Result<ToolCallResult, McpError> {
    match tool_name {
        "list_tenants" => execute_list_tenants(ctx, args).await,
        "list_projects" => execute_list_projects(ctx, args).await,
        "get_project" => execute_get_project(ctx, args).await,
        "list_revisions" => execute_list_revisions(ctx, args).await,
        "get_configuration" => execute_get_configuration(ctx, args).await,
        "list_marketplace" => execute_list_marketplace(ctx, args).await,
        "create_service_from_marketplace" => {
            execute_create_service_from_marketplace(ctx, args).await
        }
        "deploy_pipeline" => execute_deploy_pipeline(ctx, args, cancel).await,
        "get_pipeline_status" => execute_get_pipeline_status(ctx, args).await,
        "list_pods" => execute_list_pods(ctx, args).await,
        "get_pod_logs" => execute_get_pod_logs(ctx, args).await,
        _ => Err(McpError::ToolNotFound(format!("Unknown tool: {}", tool_name))),
    }
}

// === Argument helpers ===

/// Required, non-empty string argument
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, McpError> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(McpError::InvalidParams(format!("'{}' cannot be empty", key))),
        Some(_) => Err(McpError::InvalidParams(format!("'{}' must be a string", key))),
        None => Err(McpError::InvalidParams(format!("Missing required parameter '{}'", key))),
    }
}

/// Optional string argument; empty strings count as absent
pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, McpError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(McpError::InvalidParams(format!("'{}' must be a string", key))),
    }
}

pub(crate) fn optional_u64(args: &Value, key: &str) -> Result<Option<u64>, McpError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            McpError::InvalidParams(format!("'{}' must be a non-negative integer", key))
        }),
    }
}

pub(crate) fn optional_bool(args: &Value, key: &str) -> Result<Option<bool>, McpError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(McpError::InvalidParams(format!("'{}' must be a boolean", key))),
    }
}

/// `ref_type` (default `revision`) and `ref_id` as a configuration reference
pub(crate) fn configuration_ref(args: &Value) -> Result<ConfigurationRef, McpError> {
    let ref_type = optional_str(args, "ref_type")?.unwrap_or("revision");
    let ref_id = required_str(args, "ref_id")?;

    ConfigurationRef::from_parts(ref_type, ref_id).ok_or_else(|| {
        McpError::InvalidParams(format!(
            "Invalid ref_type '{}': expected 'revision' or 'environment'",
            ref_type
        ))
    })
}

// === Result helpers ===

/// Pretty-printed JSON as a text result
pub(crate) fn json_result(value: &Value) -> Result<ToolCallResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(McpError::SerializationError)?;
    Ok(ToolCallResult::text(text))
}

/// Report a console failure to the caller.
///
/// Validation failures are the caller's mistake and become `InvalidParams`;
/// everything else is returned as an error result.
pub(crate) fn console_failure(
    tool_name: &str,
    error: ConsoleError,
) -> Result<ToolCallResult, McpError> {
    if let ConsoleError::Validation(_) = error {
        return Err(error.into());
    }

    warn!(tool = tool_name, error = %error, status = ?error.status_code(), "Tool call failed");
    Ok(ToolCallResult::error(error.to_string()))
}

/// Items of a list response; accepts a bare array or a `{ "items": [...] }` page
pub(crate) fn list_items(value: &Value) -> &[Value] {
    value
        .as_array()
        .or_else(|| value.get("items").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
