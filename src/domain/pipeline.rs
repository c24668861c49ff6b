//! Deploy pipeline types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statuses after which a pipeline never changes again.
///
/// `succededWithIssues` is spelled the way the deploy backend reports it.
pub const TERMINAL_STATUSES: [&str; 6] =
    ["success", "failed", "canceled", "abandoned", "skipped", "succededWithIssues"];

/// Returns true when `status` is one of [`TERMINAL_STATUSES`]
pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

/// Pipeline identifier; providers return either numbers or strings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum PipelineId {
    Number(i64),
    String(String),
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineId::Number(n) => write!(f, "{}", n),
            PipelineId::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PipelineId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(n) => PipelineId::Number(n),
            Err(_) => PipelineId::String(value.to_string()),
        }
    }
}

/// Observed status of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineStatus {
    pub id: PipelineId,
    pub status: String,
}

impl PipelineStatus {
    pub fn is_terminal(&self) -> bool {
        is_terminal_status(&self.status)
    }
}

/// Body of a deploy trigger request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub environment: String,
    pub revision: String,
    /// `revisions` or `tags`
    pub ref_type: String,
    pub deploy_type: String,
    pub force_deploy_when_no_semver: bool,
}

impl DeployRequest {
    /// Smart deploy of a revision to an environment
    pub fn smart_deploy(environment: &str, revision: &str, ref_type: &str) -> Self {
        Self {
            environment: environment.to_string(),
            revision: revision.to_string(),
            ref_type: ref_type.to_string(),
            deploy_type: "smart_deploy".to_string(),
            force_deploy_when_no_semver: true,
        }
    }
}

/// Response of a deploy trigger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployTriggerResponse {
    pub id: PipelineId,
    pub url: String,
}
