//! Project MCP Tools
//!
//! Read-only tools for projects and their configuration revisions.

use serde_json::{json, Value};
use tracing::instrument;

use super::{console_failure, json_result, list_items, optional_str, required_str, ToolContext};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolAnnotations, ToolCallResult};

/// Tool definition for listing projects
pub fn list_projects_tool() -> Tool {
    Tool::new(
        "list_projects",
        "List projects, optionally restricted to one tenant. Returns project ids, names and environments.",
        json!({
            "type": "object",
            "properties": {
                "tenant_id": {
                    "type": "string",
                    "description": "Only return projects of this tenant"
                }
            }
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

/// Tool definition for getting a project
pub fn get_project_tool() -> Tool {
    Tool::new(
        "get_project",
        "Get the full definition of a project, including its environments and repository.",
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Id of the project"
                }
            },
            "required": ["project_id"]
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

/// Tool definition for listing revisions
pub fn list_revisions_tool() -> Tool {
    Tool::new(
        "list_revisions",
        "List the configuration revisions of a project. A revision name can be used as ref_id with ref_type 'revision'.",
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Id of the project"
                }
            },
            "required": ["project_id"]
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

fn environment_names(project: &Value) -> Vec<Value> {
    project
        .get("environments")
        .and_then(Value::as_array)
        .map(|envs| {
            envs.iter()
                .filter_map(|env| env.get("envId").or_else(|| env.get("label")).cloned())
                .collect()
        })
        .unwrap_or_default()
}

#[instrument(skip(ctx, args), name = "mcp_execute_list_projects")]
pub async fn execute_list_projects(
    ctx: &ToolContext,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let tenant_id = optional_str(&args, "tenant_id")?;

    let projects = match ctx.client.list_projects(tenant_id).await {
        Ok(projects) => projects,
        Err(e) => return console_failure("list_projects", e),
    };

    let summaries: Vec<Value> = list_items(&projects)
        .iter()
        .map(|project| {
            json!({
                "_id": project.get("_id"),
                "projectId": project.get("projectId"),
                "name": project.get("name"),
                "tenantId": project.get("tenantId"),
                "environments": environment_names(project),
            })
        })
        .collect();

    tracing::info!(tenant_id = ?tenant_id, project_count = summaries.len(), "Listed projects");

    json_result(&json!({ "projects": summaries, "count": summaries.len() }))
}

#[instrument(skip(ctx, args), name = "mcp_execute_get_project")]
pub async fn execute_get_project(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;

    match ctx.client.get_project(project_id).await {
        Ok(project) => json_result(&project),
        Err(e) => console_failure("get_project", e),
    }
}

#[instrument(skip(ctx, args), name = "mcp_execute_list_revisions")]
pub async fn execute_list_revisions(
    ctx: &ToolContext,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;

    match ctx.client.list_revisions(project_id).await {
        Ok(revisions) => {
            let names: Vec<Value> =
                list_items(&revisions).iter().filter_map(|r| r.get("name").cloned()).collect();
            json_result(&json!({ "revisions": names, "count": names.len() }))
        }
        Err(e) => console_failure("list_revisions", e),
    }
}
