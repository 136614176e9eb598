//! Fixed-interval completion waiter.
//!
//! Drives a backend's status poll to a terminal outcome or a timeout.
//! No exponential backoff: the generation services are slow (minutes)
//! relative to poll cost, so a fixed interval keeps behavior predictable.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::backend::{PollStatus, TaskHandle, VideoBackend};
use crate::error::VideogenResult;

/// Polling parameters.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Give up after this much total wall time
    pub max_wait: Duration,
    /// Sleep between polls
    pub interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(300),
            interval: Duration::from_secs(8),
        }
    }
}

impl WaitConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_wait: Duration::from_secs(
                std::env::var("GENERATION_MAX_WAIT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_wait.as_secs()),
            ),
            interval: Duration::from_secs(
                std::env::var("GENERATION_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.interval.as_secs()),
            ),
        }
    }
}

/// Terminal result of waiting on a generation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Generation finished; artifact is retrievable.
    Completed { video_url: String },
    /// The backend reported the task failed.
    Failed { reason: String },
    /// No terminal status within `max_wait`. Not a transport error.
    TimedOut { waited: Duration },
}

/// Poll `backend` at a fixed interval until the task reaches a terminal
/// state or `max_wait` elapses.
///
/// Blocks only the calling task. Transport errors from `poll` are returned
/// immediately as `Err` and are not retried.
pub async fn wait_for_completion(
    backend: &dyn VideoBackend,
    handle: &TaskHandle,
    config: &WaitConfig,
) -> VideogenResult<WaitOutcome> {
    info!(
        "Waiting for {} task {} (max {:?})",
        backend.kind(),
        handle.task_id,
        config.max_wait
    );
    let started = Instant::now();

    loop {
        let elapsed = started.elapsed();
        if elapsed > config.max_wait {
            return Ok(WaitOutcome::TimedOut { waited: elapsed });
        }

        match backend.poll(handle).await? {
            PollStatus::Completed { video_url } => {
                info!("Task {} completed", handle.task_id);
                return Ok(WaitOutcome::Completed { video_url });
            }
            PollStatus::Failed { reason } => {
                info!("Task {} failed: {}", handle.task_id, reason);
                return Ok(WaitOutcome::Failed { reason });
            }
            PollStatus::Pending { progress } => {
                debug!("Task {} still generating ({}%)", handle.task_id, progress);
            }
        }

        tokio::time::sleep(config.interval).await;
    }
}
