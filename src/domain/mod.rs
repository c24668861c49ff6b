//! # Domain Types
//!
//! Shapes exchanged with the console backend: project configurations, deploy
//! pipelines, and marketplace items.

pub mod configuration;
pub mod marketplace;
pub mod pipeline;

pub use configuration::{
    ConfigToSave, Configuration, ConfigurationRef, ResourceMap, ResourcesToCreate,
    RetrievedConfiguration, SaveResponse, SAVE_TITLE,
};
pub use marketplace::{MarketplaceItem, MarketplaceVersion};
pub use pipeline::{
    is_terminal_status, DeployRequest, DeployTriggerResponse, PipelineId, PipelineStatus,
    TERMINAL_STATUSES,
};
