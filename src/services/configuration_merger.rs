//! Configuration merge-and-save
//!
//! Reads the current configuration of a project, adds a bundle of newly
//! created resources, and stores the result as a new save.
//!
//! Each call fetches, merges, and writes in that order. Nothing is cached or
//! locked between calls: two callers saving on the same project and reference
//! race, and only the backend can reject the stale `previousSave`.

use async_trait::async_trait;
use serde_json::Map;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    ConfigToSave, Configuration, ConfigurationRef, ResourceMap, ResourcesToCreate,
    RetrievedConfiguration, SaveResponse, SAVE_TITLE,
};
use crate::errors::{ConsoleError, Result};

/// Storage of project configurations
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Fetch the configuration currently persisted at `reference`
    async fn get_configuration(
        &self,
        project_id: &str,
        reference: &ConfigurationRef,
    ) -> Result<RetrievedConfiguration>;

    /// Persist a new configuration save at `reference`
    async fn save_configuration(
        &self,
        project_id: &str,
        reference: &ConfigurationRef,
        payload: &ConfigToSave,
    ) -> Result<SaveResponse>;
}

/// Options for [`ConfigurationMerger::save_configuration`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Abort when a service of the bundle already exists
    pub throw_if_service_already_exists: bool,
}

impl SaveOptions {
    /// Options used when creating brand new services
    pub fn guarded() -> Self {
        Self { throw_if_service_already_exists: true }
    }
}

/// Merges resource bundles into stored configurations
pub struct ConfigurationMerger {
    store: Arc<dyn ConfigurationStore>,
}

impl ConfigurationMerger {
    pub fn new(store: Arc<dyn ConfigurationStore>) -> Self {
        Self { store }
    }

    /// Fetch the configuration currently stored at `reference`
    #[instrument(skip(self, reference), fields(reference = %reference))]
    pub async fn get_configuration(
        &self,
        project_id: &str,
        reference: &ConfigurationRef,
    ) -> Result<RetrievedConfiguration> {
        self.store.get_configuration(project_id, reference).await
    }

    /// Merge `resources` into the stored configuration and save the result.
    ///
    /// With [`SaveOptions::throw_if_service_already_exists`] a service name
    /// collision aborts before anything is written.
    #[instrument(
        skip(self, reference, resources),
        fields(reference = %reference, services = ?resources.service_names())
    )]
    pub async fn save_configuration(
        &self,
        project_id: &str,
        reference: &ConfigurationRef,
        resources: &ResourcesToCreate,
        options: SaveOptions,
    ) -> Result<SaveResponse> {
        let current = self.get_configuration(project_id, reference).await?;

        if options.throw_if_service_already_exists {
            check_service_conflicts(&current.config, resources)?;
        }

        let payload = build_config_to_save(current, resources);

        debug!(
            project_id = %project_id,
            previous_save = ?payload.previous_save,
            "Saving merged configuration"
        );

        let response = self.store.save_configuration(project_id, reference, &payload).await?;

        info!(
            project_id = %project_id,
            save_id = %response.id,
            "Configuration saved"
        );

        Ok(response)
    }
}

/// Fail with a conflict naming the first bundle service already configured
pub fn check_service_conflicts(
    current: &Configuration,
    resources: &ResourcesToCreate,
) -> Result<()> {
    if let Some(name) =
        resources.service_names().into_iter().find(|name| current.services.contains_key(*name))
    {
        warn!(service = %name, "Service already exists in configuration");
        return Err(ConsoleError::conflict("service", name));
    }
    Ok(())
}

/// Union of the current configuration and the bundle, bundle entries winning
pub fn merge_resources(current: Configuration, resources: &ResourcesToCreate) -> Configuration {
    Configuration {
        services: merge_kind(current.services, &resources.services),
        service_accounts: merge_kind(current.service_accounts, &resources.service_accounts),
        config_maps: merge_kind(current.config_maps, &resources.config_maps),
        service_secrets: merge_kind(current.service_secrets, &resources.service_secrets),
        listeners: merge_kind(current.listeners, &resources.listeners),
        endpoints: merge_kind(current.endpoints, &resources.endpoints),
        collections: merge_kind(current.collections, &resources.collections),
        extra: current.extra,
    }
}

fn merge_kind(mut current: ResourceMap, delta: &Option<ResourceMap>) -> ResourceMap {
    if let Some(delta) = delta {
        current.extend(delta.iter().map(|(name, value)| (name.clone(), value.clone())));
    }
    current
}

/// Build the save payload for `current` plus `resources`
pub fn build_config_to_save(
    current: RetrievedConfiguration,
    resources: &ResourcesToCreate,
) -> ConfigToSave {
    ConfigToSave {
        title: SAVE_TITLE.to_string(),
        previous_save: current.commit_id,
        config: merge_resources(current.config, resources),
        fast_data_config: current.fast_data_config,
        microfrontend_plugins_config: current.microfrontend_plugins_config,
        extensions_config: current.extensions_config,
        deleted_elements: Map::new(),
    }
}
