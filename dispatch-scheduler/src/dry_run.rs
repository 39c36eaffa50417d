//! Dry-run backend
//!
//! Records the `bsub` invocation each job would need and never runs
//! anything. Used by `dispatch submit --backend dry-run` to review a batch
//! before it reaches the cluster.

use async_trait::async_trait;
use dispatch_core::domain::{JobSpec, Submission};
use dispatch_core::render::shell_join;
use std::sync::Mutex;
use tracing::info;

use crate::Scheduler;
use crate::error::Result;
use crate::lsf::DEFAULT_BSUB;

/// Scheduler backend that only records what would be submitted
#[derive(Debug, Default)]
pub struct DryRunScheduler {
    recorded: Mutex<Vec<Vec<String>>>,
}

impl DryRunScheduler {
    /// Backend name recorded on its submissions
    pub const NAME: &'static str = "dry-run";

    pub fn new() -> Self {
        Self::default()
    }

    /// Full `bsub` command lines recorded so far, in submission order
    pub fn recorded(&self) -> Vec<Vec<String>> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Scheduler for DryRunScheduler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn submit(&self, spec: &JobSpec) -> Result<Submission> {
        let mut command = vec![DEFAULT_BSUB.to_string()];
        command.extend(spec.bsub_args());

        info!("Would run: {}", shell_join(&command));

        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command);

        Ok(Submission {
            job_id: None,
            job_name: spec.job_name.clone(),
            queue: spec.queue.clone(),
            dataset: spec.dataset.clone(),
            log_path: None,
            backend: self.name(),
            submitted_at: chrono::Utc::now(),
        })
    }
}
