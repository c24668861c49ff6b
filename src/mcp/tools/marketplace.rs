//! Marketplace MCP Tools
//!
//! Browse marketplace items and add a plugin item to a project configuration
//! as a new service.

use serde_json::{json, Value};
use tracing::instrument;

use super::{
    configuration_ref, console_failure, json_result, optional_str, required_str, ToolContext,
};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolAnnotations, ToolCallResult};
use crate::services::SaveOptions;

/// Tool definition for listing marketplace items
pub fn list_marketplace_tool() -> Tool {
    Tool::new(
        "list_marketplace",
        "List marketplace items (plugins, templates, examples, applications). Plugins can be added to a project with create_service_from_marketplace.",
        json!({
            "type": "object",
            "properties": {
                "tenant_id": {
                    "type": "string",
                    "description": "Include the private items of this tenant"
                },
                "type": {
                    "type": "string",
                    "description": "Only return items of this type, e.g. 'plugin'"
                }
            }
        }),
    )
    .with_annotations(ToolAnnotations::read_only())
}

/// Tool definition for creating a service from a marketplace plugin
pub fn create_service_from_marketplace_tool() -> Tool {
    Tool::new(
        "create_service_from_marketplace",
        "Add a marketplace plugin to a project configuration as a new service, together with its config maps and service account. Fails without saving when a service with the same name already exists.",
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
                "tenant_id": {
                    "type": "string",
                    "description": "Tenant owning the marketplace item (e.g. 'public' or the project's tenant)"
                },
                "item_id": {
                    "type": "string",
                    "description": "Marketplace item id"
                },
                "version": {
                    "type": "string",
                    "description": "Item version (default: latest)"
                },
                "name": {
                    "type": "string",
                    "description": "Name of the service to create"
                }
            },
            "required": ["project_id", "ref_id", "tenant_id", "item_id", "name"]
        }),
    )
    .with_annotations(ToolAnnotations::writes())
}

#[instrument(skip(ctx, args), name = "mcp_execute_list_marketplace")]
pub async fn execute_list_marketplace(
    ctx: &ToolContext,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let tenant_id = optional_str(&args, "tenant_id")?;
    let item_type = optional_str(&args, "type")?;

    let items = match ctx.client.list_marketplace(tenant_id, item_type).await {
        Ok(items) => items,
        Err(e) => return console_failure("list_marketplace", e),
    };

    let summaries: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "itemId": item.item_id,
                "name": item.name,
                "type": item.item_type,
                "tenantId": item.tenant_id,
                "version": item.version.as_ref().map(|v| v.name.as_str()),
                "description": item.description,
            })
        })
        .collect();

    tracing::info!(item_count = summaries.len(), "Listed marketplace items");

    json_result(&json!({ "items": summaries, "count": summaries.len() }))
}

#[instrument(skip(ctx, args), name = "mcp_execute_create_service_from_marketplace")]
pub async fn execute_create_service_from_marketplace(
    ctx: &ToolContext,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let project_id = required_str(&args, "project_id")?;
    let reference = configuration_ref(&args)?;
    let tenant_id = required_str(&args, "tenant_id")?;
    let item_id = required_str(&args, "item_id")?;
    let version = optional_str(&args, "version")?;
    let name = required_str(&args, "name")?;

    let item = match ctx.client.get_marketplace_item(tenant_id, item_id, version).await {
        Ok(item) => item,
        Err(e) => return console_failure("create_service_from_marketplace", e),
    };

    let resources = match item.to_resources(name) {
        Ok(resources) => resources,
        Err(e) => return console_failure("create_service_from_marketplace", e),
    };

    let saved = match ctx
        .merger
        .save_configuration(project_id, &reference, &resources, SaveOptions::guarded())
        .await
    {
        Ok(saved) => saved,
        Err(e) => return console_failure("create_service_from_marketplace", e),
    };

    tracing::info!(
        project_id = %project_id,
        reference = %reference,
        service = %name,
        save_id = %saved.id,
        "Created service from marketplace item"
    );

    json_result(&json!({
        "saveId": saved.id,
        "upgraded": saved.upgraded,
        "service": name,
        "itemId": item.item_id,
        "version": item.version.as_ref().map(|v| v.name.as_str()),
        "configMaps": resources.config_maps.as_ref().map(|m| m.keys().collect::<Vec<_>>()),
        "serviceAccounts": resources.service_accounts.as_ref().map(|m| m.keys().collect::<Vec<_>>()),
    }))
}
