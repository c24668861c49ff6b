//! Runtime MCP Tools
//!
//! Inspect the pods running in a project environment and read container logs.

use serde_json::{json, Value};
use tracing::instrument;

use super::{console_failure, json_result, list_items, optional_u64, required_str, ToolContext};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolAnnotations, ToolCallResult};

/// Log lines returned when the caller does not ask for a specific amount
const DEFAULT_TAIL_LINES: u64 = 500;

pub fn list_pods_tool() -> Tool {
    Tool::new(
        "list_pods",
        "List the pods running in an environment of a project, with their phase, readiness, restarts and containers.",
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Id of the project"
                },
                "environment": {
                    "type": "string",
                    "description": "Environment id"
                }
            },
            "required": ["project_id", "environment"]
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

pub fn get_pod_logs_tool() -> Tool {
    Tool::new(
        "get_pod_logs",
        "Read the latest log lines of a container in a pod. Use list_pods to find pod and container names.",
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Id of the project"
                },
                "environment": {
                    "type": "string",
                    "description": "Environment id"
                },
                "pod_name": {
                    "type": "string",
                    "description": "Name of the pod"
                },
                "container_name": {
                    "type": "string",
                    "description": "Name of the container inside the pod"
                },
                "tail_lines": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Number of lines from the end of the log (default: 500)"
                }
            },
            "required": ["project_id", "environment", "pod_name", "container_name"]
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

fn summarise_pod(pod: &Value) -> Value {
    let containers: Vec<Value> = pod
        .get("containers")
        .and_then(Value::as_array)
        .map(|containers| {
            containers
                .iter()
                .map(|c| {
                    json!({
                        "name": c.get("name"),
                        "ready": c.get("ready"),
                        "restarts": c.get("restarts"),
                        "status": c.get("status"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "name": pod.get("name"),
        "phase": pod.get("phase"),
        "status": pod.get("status"),
        "age": pod.get("age"),
        "component": pod.get("labels").and_then(|l| l.get("app.kubernetes.io/name")),
        "containers": containers,
    })
}

#[instrument(skip(ctx, args), name = "mcp_execute_list_pods")]
pub async fn execute_list_pods(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;
    let environment = required_str(&args, "environment")?;

    let pods = match ctx.client.list_pods(project_id, environment).await {
        Ok(pods) => pods,
        Err(e) => return console_failure("list_pods", e),
    };

    let summaries: Vec<Value> = list_items(&pods).iter().map(summarise_pod).collect();

    json_result(&json!({
        "environment": environment,
        "pods": summaries,
        "count": summaries.len(),
    }))
}

#[instrument(skip(ctx, args), name = "mcp_execute_get_pod_logs")]
pub async fn execute_get_pod_logs(
    ctx: &ToolContext,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;
    let environment = required_str(&args, "environment")?;
    let pod = required_str(&args, "pod_name")?;
    let container = required_str(&args, "container_name")?;
    let tail_lines = optional_u64(&args, "tail_lines")?.unwrap_or(DEFAULT_TAIL_LINES);
    let tail_lines = u32::try_from(tail_lines)
        .map_err(|_| McpError::InvalidParams("'tail_lines' is too large".to_string()))?;

    match ctx.client.pod_logs(project_id, environment, pod, container, Some(tail_lines)).await {
        Ok(logs) if logs.is_empty() => {
            Ok(ToolCallResult::text(format!("No log lines for {}/{}", pod, container)))
        }
        Ok(logs) => Ok(ToolCallResult::text(logs)),
        Err(e) => console_failure("get_pod_logs", e),
    }
}
