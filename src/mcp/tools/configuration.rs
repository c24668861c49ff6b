//! Configuration MCP Tools

use serde_json::{json, Value};
use tracing::instrument;

use super::{configuration_ref, console_failure, json_result, optional_bool, required_str, ToolContext};
use crate::domain::{Configuration, ResourceMap};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolAnnotations, ToolCallResult};

/// Tool definition for reading a project configuration
pub fn get_configuration_tool() -> Tool {
    Tool::new(
        "get_configuration",
        "Read the configuration of a project at a revision or environment. By default returns the names of services, config maps, endpoints and other resources; set full to true for the complete document.",
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Id of the project"
                },
                "ref_type": {
                    "type": "string",
                    "enum": ["revision", "environment"],
                    "description": "Whether ref_id names a revision or an environment (default: revision)"
                },
                "ref_id": {
                    "type": "string",
                    "description": "Revision or environment name"
                },
                "full": {
                    "type": "boolean",
                    "description": "Return the whole configuration document (default: false)"
                }
            },
            "required": ["project_id", "ref_id"]
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

fn names(resources: &ResourceMap) -> Vec<&str> {
    resources.keys().map(String::as_str).collect()
}

/// Resource names per kind
fn summarise(config: &Configuration) -> Value {
    json!({
        "services": names(&config.services),
        "serviceAccounts": names(&config.service_accounts),
        "configMaps": names(&config.config_maps),
        "serviceSecrets": names(&config.service_secrets),
        "listeners": names(&config.listeners),
        "endpoints": names(&config.endpoints),
        "collections": names(&config.collections),
    })
}

#[instrument(skip(ctx, args), name = "mcp_execute_get_configuration")]
pub async fn execute_get_configuration(
    ctx: &ToolContext,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;
    let reference = configuration_ref(&args)?;
    let full = optional_bool(&args, "full")?.unwrap_or(false);

    let retrieved = match ctx.merger.get_configuration(project_id, &reference).await {
        Ok(retrieved) => retrieved,
        Err(e) => return console_failure("get_configuration", e),
    };

    let mut output = json!({
        "projectId": project_id,
        "reference": reference.to_string(),
        "commitId": retrieved.commit_id,
        "resources": summarise(&retrieved.config),
    });
    if full {
        output["configuration"] =
            serde_json::to_value(&retrieved).map_err(McpError::SerializationError)?;
    }

    json_result(&output)
}
