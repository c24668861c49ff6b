//! Deploy MCP Tools
//!
//! Trigger deploy pipelines and follow them to completion.

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::{
    console_failure, json_result, optional_bool, optional_str, optional_u64, required_str,
    ToolContext,
};
use crate::domain::{DeployRequest, PipelineId};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{ContentBlock, Tool, ToolAnnotations, ToolCallResult};
use crate::services::pipeline_watcher::{WaitOptions, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
use crate::services::PipelineStatusSource;

/// Tool definition for deploying a project
pub fn deploy_pipeline_tool() -> Tool {
    Tool::new(
        "deploy_pipeline",
        "Deploy a revision or tag of a project to an environment. Returns the pipeline id and url; with wait set to true, polls the pipeline until it finishes or the timeout elapses. A timeout does not stop the pipeline.",
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Id of the project"
                },
                "environment": {
                    "type": "string",
                    "description": "Target environment id"
                },
                "revision": {
                    "type": "string",
                    "description": "Revision or tag to deploy"
                },
                "ref_type": {
                    "type": "string",
                    "enum": ["revisions", "tags"],
                    "description": "Whether revision names a revision or a tag (default: revisions)"
                },
                "wait": {
                    "type": "boolean",
                    "description": "Wait for the pipeline to finish (default: false)"
                },
                "timeout_ms": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Maximum wait in milliseconds (default: 300000)"
                },
                "interval_ms": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Delay between status checks in milliseconds (default: 5000)"
                }
            },
            "required": ["project_id", "environment", "revision"]
        }),
    )
    .with_annotations(ToolAnnotations::writes())
}

/// Tool definition for reading a pipeline status
pub fn get_pipeline_status_tool() -> Tool {
    Tool::new(
        "get_pipeline_status",
        "Get the current status of a deploy pipeline. Final statuses are success, failed, canceled, abandoned, skipped and succededWithIssues.",
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Id of the project"
                },
                "pipeline_id": {
                    "type": "string",
                    "description": "Pipeline id returned by deploy_pipeline"
                },
                "environment": {
                    "type": "string",
                    "description": "Environment the pipeline deploys to"
                }
            },
            "required": ["project_id", "pipeline_id"]
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

/// Pipeline ids may arrive as JSON numbers or strings
fn pipeline_id_arg(args: &Value) -> Result<PipelineId, McpError> {
    match args.get("pipeline_id") {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(PipelineId::Number)
            .ok_or_else(|| McpError::InvalidParams("'pipeline_id' must be an integer".to_string())),
        Some(Value::String(_)) => Ok(PipelineId::from(required_str(args, "pipeline_id")?)),
        _ => Err(McpError::InvalidParams("Missing required parameter 'pipeline_id'".to_string())),
    }
}

fn wait_options(args: &Value) -> Result<WaitOptions, McpError> {
    let timeout_ms = optional_u64(args, "timeout_ms")?.unwrap_or(DEFAULT_TIMEOUT.as_millis() as u64);
    let interval_ms =
        optional_u64(args, "interval_ms")?.unwrap_or(DEFAULT_INTERVAL.as_millis() as u64);
    if interval_ms == 0 {
        return Err(McpError::InvalidParams("'interval_ms' must be at least 1".to_string()));
    }
    Ok(WaitOptions::from_millis(timeout_ms, interval_ms))
}

#[instrument(skip(ctx, args, cancel), name = "mcp_execute_deploy_pipeline")]
pub async fn execute_deploy_pipeline(
    ctx: &ToolContext,
    args: Value,
    cancel: &CancellationToken,
) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;
    let environment = required_str(&args, "environment")?;
    let revision = required_str(&args, "revision")?;
    let ref_type = optional_str(&args, "ref_type")?.unwrap_or("revisions");
    if !matches!(ref_type, "revisions" | "tags") {
        return Err(McpError::InvalidParams(format!(
            "Invalid ref_type '{}': expected 'revisions' or 'tags'",
            ref_type
        )));
    }
    let wait = optional_bool(&args, "wait")?.unwrap_or(false);
    let options = wait_options(&args)?;

    let request = DeployRequest::smart_deploy(environment, revision, ref_type);
    let triggered = match ctx.client.trigger_deploy(project_id, &request).await {
        Ok(triggered) => triggered,
        Err(e) => return console_failure("deploy_pipeline", e),
    };

    tracing::info!(
        project_id = %project_id,
        environment = %environment,
        pipeline_id = %triggered.id,
        "Triggered deploy pipeline"
    );

    let mut output = json!({
        "pipelineId": triggered.id,
        "url": triggered.url,
    });

    if wait {
        let status = ctx
            .watcher
            .wait_for_completion_with_cancel(
                project_id,
                &triggered.id,
                Some(environment),
                options,
                cancel,
            )
            .await;
        match status {
            Ok(status) => output["status"] = json!(status.status),
            Err(e) => {
                // The pipeline keeps running; tell the caller where to follow it.
                let mut failure = console_failure("deploy_pipeline", e)?;
                failure.content.push(ContentBlock::Text {
                    text: serde_json::to_string_pretty(&output)
                        .map_err(McpError::SerializationError)?,
                });
                return Ok(failure);
            }
        }
    }

    json_result(&output)
}

#[instrument(skip(ctx, args), name = "mcp_execute_get_pipeline_status")]
pub async fn execute_get_pipeline_status(
    ctx: &ToolContext,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;
    let pipeline_id = pipeline_id_arg(&args)?;
    let environment = optional_str(&args, "environment")?;

    match ctx.client.get_pipeline_status(project_id, &pipeline_id, environment).await {
        Ok(status) => json_result(&json!({
            "pipelineId": status.id,
            "status": status.status,
            "finished": status.is_terminal(),
        })),
        Err(e) => console_failure("get_pipeline_status", e),
    }
}
