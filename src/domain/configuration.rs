//! Project configuration documents
//!
//! A configuration is a set of keyed resource collections plus opaque fields
//! the server never interprets. Resource definitions stay as raw JSON: the
//! merge only cares about names.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Resource name → resource definition
pub type ResourceMap = BTreeMap<String, Value>;

/// Title attached to every configuration save produced by this server
pub const SAVE_TITLE: &str = "[console-mcp] add resources";

/// Which configuration line of a project is addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationRef {
    /// A revision (git-like branch) of the project configuration
    Revision(String),
    /// A named environment with its own configuration
    Environment(String),
}

impl ConfigurationRef {
    /// Parse a reference from a tool argument pair (`refType`, `refId`)
    pub fn from_parts(ref_type: &str, ref_id: &str) -> Option<Self> {
        match ref_type {
            "revision" | "revisions" => Some(Self::Revision(ref_id.to_string())),
            "environment" | "environments" => Some(Self::Environment(ref_id.to_string())),
            _ => None,
        }
    }

    /// Name of the addressed revision or environment
    pub fn name(&self) -> &str {
        match self {
            Self::Revision(name) | Self::Environment(name) => name,
        }
    }

    /// Path segment used by the backend (`revisions` or `environments`)
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Revision(_) => "revisions",
            Self::Environment(_) => "environments",
        }
    }
}

impl fmt::Display for ConfigurationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path_segment(), self.name())
    }
}

/// A kind sent as `null` is the same as a missing one
fn null_as_empty<'de, D>(deserializer: D) -> Result<ResourceMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ResourceMap>::deserialize(deserializer)?.unwrap_or_default())
}

/// Declarative resource document of a project at one reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub services: ResourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_accounts: ResourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config_maps: ResourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_secrets: ResourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub listeners: ResourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub endpoints: ResourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub collections: ResourceMap,

    /// Every other field of the document, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Configuration as returned by the store, with its save pointer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedConfiguration {
    /// Optimistic-concurrency token for the next save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_features: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_data_config: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microfrontend_plugins_config: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions_config: Option<Value>,

    #[serde(flatten)]
    pub config: Configuration,
}

/// Resources to add to a configuration; every kind is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesToCreate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<ResourceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_accounts: Option<ResourceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_maps: Option<ResourceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_secrets: Option<ResourceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listeners: Option<ResourceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<ResourceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<ResourceMap>,
}

impl ResourcesToCreate {
    /// True when no kind carries any resource
    pub fn is_empty(&self) -> bool {
        [
            &self.services,
            &self.service_accounts,
            &self.config_maps,
            &self.service_secrets,
            &self.listeners,
            &self.endpoints,
            &self.collections,
        ]
        .iter()
        .all(|kind| kind.as_ref().map_or(true, |m| m.is_empty()))
    }

    /// Names of the services the bundle creates
    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().flat_map(|m| m.keys().map(String::as_str)).collect()
    }
}

/// Wire payload for persisting a configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigToSave {
    pub title: String,
    pub previous_save: Option<String>,
    pub config: Configuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_data_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microfrontend_plugins_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions_config: Option<Value>,
    pub deleted_elements: Map<String, Value>,
}

/// Response of a configuration save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retrieved_configuration_splits_metadata_from_config() {
        let raw = json!({
            "commitId": "abc123",
            "enabledFeatures": {"visualize": true},
            "fastDataConfig": {"castFunctions": {}},
            "services": {"api": {"name": "api", "dockerImage": "nginx"}},
            "endpoints": {"/api": {"basePath": "/api"}},
            "platformVersion": "13.0.0"
        });

        let retrieved: RetrievedConfiguration = serde_json::from_value(raw).unwrap();

        assert_eq!(retrieved.commit_id.as_deref(), Some("abc123"));
        assert_eq!(retrieved.fast_data_config, Some(json!({"castFunctions": {}})));
        assert!(retrieved.microfrontend_plugins_config.is_none());
        assert_eq!(retrieved.config.services.len(), 1);
        assert_eq!(retrieved.config.endpoints["/api"]["basePath"], "/api");
        assert!(retrieved.config.config_maps.is_empty());
        assert_eq!(retrieved.config.extra.get("platformVersion"), Some(&json!("13.0.0")));
        assert!(!retrieved.config.extra.contains_key("commitId"));
    }

    #[test]
    fn test_null_kind_is_treated_as_empty() {
        let raw = json!({
            "commitId": "c1",
            "services": {"a": {}},
            "listeners": null,
            "collections": null
        });

        let retrieved: RetrievedConfiguration = serde_json::from_value(raw).unwrap();
        assert!(retrieved.config.listeners.is_empty());
        assert!(!retrieved.config.extra.contains_key("listeners"));

        let delta = ResourcesToCreate {
            listeners: Some(ResourceMap::from([("frontend".to_string(), json!({"port": 8080}))])),
            ..Default::default()
        };
        let saved = crate::services::configuration_merger::build_config_to_save(retrieved, &delta);

        assert_eq!(saved.config.listeners, delta.listeners.clone().unwrap());
        assert!(saved.config.collections.is_empty());
        assert_eq!(saved.config.services.len(), 1);
    }

    #[test]
    fn test_config_to_save_wire_shape() {
        let payload = ConfigToSave {
            title: SAVE_TITLE.to_string(),
            previous_save: Some("abc123".to_string()),
            config: Configuration::default(),
            fast_data_config: None,
            microfrontend_plugins_config: Some(json!({})),
            extensions_config: None,
            deleted_elements: Map::new(),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["previousSave"], "abc123");
        assert_eq!(value["deletedElements"], json!({}));
        assert_eq!(value["microfrontendPluginsConfig"], json!({}));
        assert!(value.get("fastDataConfig").is_none());
        assert_eq!(value["config"]["serviceAccounts"], json!({}));
    }

    #[test]
    fn test_resources_to_create_emptiness() {
        let mut resources = ResourcesToCreate::default();
        assert!(resources.is_empty());

        resources.listeners = Some(ResourceMap::new());
        assert!(resources.is_empty());

        resources.services = Some(ResourceMap::from([("api".to_string(), json!({}))]));
        assert!(!resources.is_empty());
        assert_eq!(resources.service_names(), vec!["api"]);
    }

    #[test]
    fn test_configuration_ref_parsing() {
        assert_eq!(
            ConfigurationRef::from_parts("revision", "main"),
            Some(ConfigurationRef::Revision("main".to_string()))
        );
        assert_eq!(
            ConfigurationRef::from_parts("environment", "dev"),
            Some(ConfigurationRef::Environment("dev".to_string()))
        );
        assert_eq!(ConfigurationRef::from_parts("tag", "v1"), None);
        assert_eq!(ConfigurationRef::Revision("main".to_string()).to_string(), "revisions/main");
    }
}
