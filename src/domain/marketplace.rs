//! Marketplace items and their conversion into configuration resources

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::configuration::{ResourceMap, ResourcesToCreate};
use crate::errors::{ConsoleError, Result};

/// Marketplace item summary or detail, as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceItem {
    pub item_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<MarketplaceVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketplaceVersion {
    pub name: String,
}

impl MarketplaceItem {
    /// Turn a `plugin` item into the resources that run it as `service_name`.
    ///
    /// The first service template of the item is used. Config maps declared by
    /// the template become standalone config maps mounted into the service, and
    /// the service gets a service account of its own.
    pub fn to_resources(&self, service_name: &str) -> Result<ResourcesToCreate> {
        if service_name.trim().is_empty() {
            return Err(ConsoleError::validation("service name cannot be empty"));
        }
        if self.item_type != "plugin" {
            return Err(ConsoleError::validation(format!(
                "marketplace item '{}' has type '{}', only 'plugin' items can be added as services",
                self.item_id, self.item_type
            )));
        }

        let template = self
            .resources
            .as_ref()
            .and_then(|r| r.get("services"))
            .and_then(Value::as_object)
            .and_then(|services| services.values().next())
            .ok_or_else(|| {
                ConsoleError::validation(format!(
                    "marketplace item '{}' does not declare any service",
                    self.item_id
                ))
            })?;

        let mut config_maps = ResourceMap::new();
        let mut mounts = Vec::new();
        for cm in template.get("defaultConfigMaps").and_then(Value::as_array).into_iter().flatten() {
            let Some(name) = cm.get("name").and_then(Value::as_str) else { continue };
            let files = cm.get("files").cloned().unwrap_or_else(|| json!([]));
            config_maps.insert(name.to_string(), json!({ "name": name, "files": files }));
            mounts.push(json!({
                "name": name,
                "mountPath": cm.get("mountPath").cloned().unwrap_or(Value::Null),
                "viewAsReadOnly": cm.get("viewAsReadOnly").cloned().unwrap_or(json!(false)),
                "link": { "targetSection": "config-maps" },
            }));
        }

        let environment: Vec<Value> = template
            .get("defaultEnvironmentVariables")
            .and_then(Value::as_array)
            .map(|vars| {
                vars.iter()
                    .filter_map(|v| {
                        let name = v.get("name").and_then(Value::as_str)?;
                        Some(json!({
                            "name": name,
                            "value": v.get("value").cloned().unwrap_or(json!("")),
                            "valueType": v.get("valueType").cloned().unwrap_or(json!("plain")),
                        }))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut service = Map::new();
        service.insert("name".to_string(), json!(service_name));
        service.insert("type".to_string(), json!("plugin"));
        service.insert("advanced".to_string(), json!(false));
        service.insert("replicas".to_string(), json!(1));
        service.insert(
            "description".to_string(),
            template
                .get("description")
                .cloned()
                .or_else(|| self.description.clone().map(Value::String))
                .unwrap_or(Value::Null),
        );
        for (from, to) in [
            ("dockerImage", "dockerImage"),
            ("containerPorts", "containerPorts"),
            ("defaultResources", "resources"),
            ("defaultLogParser", "logParser"),
            ("defaultProbes", "probes"),
        ] {
            if let Some(value) = template.get(from) {
                service.insert(to.to_string(), value.clone());
            }
        }
        service.insert("environment".to_string(), Value::Array(environment));
        service.insert("configMaps".to_string(), Value::Array(mounts));
        service.insert("serviceAccountName".to_string(), json!(service_name));
        service.insert(
            "sourceMarketplaceItem".to_string(),
            json!({
                "itemId": self.item_id,
                "tenantId": self.tenant_id,
                "version": self.version.as_ref().map(|v| v.name.clone()),
            }),
        );

        let services = ResourceMap::from([(service_name.to_string(), Value::Object(service))]);
        let service_accounts =
            ResourceMap::from([(service_name.to_string(), json!({ "name": service_name }))]);

        Ok(ResourcesToCreate {
            services: Some(services),
            service_accounts: Some(service_accounts),
            config_maps: (!config_maps.is_empty()).then_some(config_maps),
            ..Default::default()
        })
    }
}
