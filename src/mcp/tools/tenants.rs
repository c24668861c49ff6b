//! Tenant MCP Tools

use serde_json::{json, Value};
use tracing::instrument;

use super::{console_failure, json_result, list_items, ToolContext};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolAnnotations, ToolCallResult};

/// Tool definition for listing tenants
pub fn list_tenants_tool() -> Tool {
    Tool::new(
        "list_tenants",
        "List the tenants (companies) the caller can access. Tenant ids are needed to list projects and marketplace items.",
        json!({
            "type": "object",
            "properties": {}
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

#[instrument(skip(ctx, _args), name = "mcp_execute_list_tenants")]
pub async fn execute_list_tenants(
    ctx: &ToolContext,
    _args: Value,
) -> Result<ToolCallResult, McpError> {
    let tenants = match ctx.client.list_tenants().await {
        Ok(tenants) => tenants,
        Err(e) => return console_failure("list_tenants", e),
    };

    let summaries: Vec<Value> = list_items(&tenants)
        .iter()
        .map(|tenant| {
            json!({
                "tenantId": tenant.get("tenantId"),
                "name": tenant.get("name"),
                "defaultTemplateId": tenant.get("defaultTemplateId"),
            })
        })
        .collect();

    tracing::info!(tenant_count = summaries.len(), "Listed tenants");

    json_result(&json!({ "tenants": summaries, "count": summaries.len() }))
}
