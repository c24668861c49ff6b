//! Business logic services
//!
//! Components that encapsulate console workflows, separated from the HTTP
//! client and the MCP surface. Each service talks to the backend through a
//! narrow trait so it can be exercised against in-memory doubles.

pub mod configuration_merger;
pub mod pipeline_watcher;

pub use configuration_merger::{ConfigurationMerger, ConfigurationStore, SaveOptions};
pub use pipeline_watcher::{DeployPipelineWatcher, PipelineStatusSource, WaitOptions};
