//! Deploy pipeline watcher
//!
//! Polls the status of a triggered pipeline until it reaches a terminal state
//! or the wall-clock budget runs out. The watcher only reads: a timeout leaves
//! the pipeline running.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::{PipelineId, PipelineStatus};
use crate::errors::{ConsoleError, Result};

/// Default wait budget (5 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(300_000);

/// Default delay between two status reads (5 seconds)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5_000);

/// Source of pipeline status reads
#[async_trait]
pub trait PipelineStatusSource: Send + Sync {
    async fn get_pipeline_status(
        &self,
        project_id: &str,
        pipeline_id: &PipelineId,
        environment: Option<&str>,
    ) -> Result<PipelineStatus>;
}

/// Timing of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT, interval: DEFAULT_INTERVAL }
    }
}

impl WaitOptions {
    pub fn from_millis(timeout_ms: u64, interval_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            interval: Duration::from_millis(interval_ms),
        }
    }
}

/// Waits for deploy pipelines to finish
pub struct DeployPipelineWatcher {
    source: Arc<dyn PipelineStatusSource>,
}

impl DeployPipelineWatcher {
    pub fn new(source: Arc<dyn PipelineStatusSource>) -> Self {
        Self { source }
    }

    /// Poll until the pipeline is terminal or `options.timeout` has elapsed.
    ///
    /// A failed status read ends the wait immediately; only a non-terminal
    /// status leads to another poll.
    pub async fn wait_for_completion(
        &self,
        project_id: &str,
        pipeline_id: &PipelineId,
        environment: Option<&str>,
        options: WaitOptions,
    ) -> Result<PipelineStatus> {
        self.poll(project_id, pipeline_id, environment, options, None).await
    }

    /// Same as [`Self::wait_for_completion`], abandoning the wait with
    /// [`ConsoleError::Cancelled`] once `cancel` fires.
    pub async fn wait_for_completion_with_cancel(
        &self,
        project_id: &str,
        pipeline_id: &PipelineId,
        environment: Option<&str>,
        options: WaitOptions,
        cancel: &CancellationToken,
    ) -> Result<PipelineStatus> {
        self.poll(project_id, pipeline_id, environment, options, Some(cancel)).await
    }

    #[instrument(
        skip(self, pipeline_id, options, cancel),
        fields(pipeline_id = %pipeline_id, timeout_ms = options.timeout.as_millis() as u64)
    )]
    async fn poll(
        &self,
        project_id: &str,
        pipeline_id: &PipelineId,
        environment: Option<&str>,
        options: WaitOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<PipelineStatus> {
        let start = Instant::now();
        let mut polls: u32 = 0;

        loop {
            let status =
                self.source.get_pipeline_status(project_id, pipeline_id, environment).await?;
            polls += 1;

            if status.is_terminal() {
                info!(status = %status.status, polls, "Pipeline reached terminal status");
                return Ok(status);
            }

            if start.elapsed() > options.timeout {
                warn!(status = %status.status, polls, "Timed out waiting for pipeline");
                return Err(ConsoleError::timeout(
                    format!("waiting for pipeline {}", pipeline_id),
                    options.timeout.as_millis() as u64,
                ));
            }

            debug!(status = %status.status, polls, "Pipeline still in progress");

            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            info!(polls, "Pipeline wait cancelled");
                            return Err(ConsoleError::cancelled(format!(
                                "waiting for pipeline {}",
                                pipeline_id
                            )));
                        }
                        _ = tokio::time::sleep(options.interval) => {}
                    }
                }
                None => tokio::time::sleep(options.interval).await,
            }
        }
    }
}
