//! Dispatch Scheduler Backends
//!
//! Hands `JobSpec`s to a batch scheduler. Every backend implements the same
//! fire-and-forget contract: `submit` returns once the job is accepted or
//! rejected and never interprets the downstream program's exit status.
//!
//! Backends:
//! - `LsfScheduler`: submits through `bsub`
//! - `LocalScheduler`: runs the command on this host
//! - `DryRunScheduler`: records what would be submitted
//!
//! # Example
//!
//! ```no_run
//! use dispatch_core::domain::{GpuMode, GpuRequest, JobTemplate};
//! use dispatch_scheduler::{LsfScheduler, Scheduler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gpu = GpuRequest::new(1, GpuMode::ExclusiveProcess, None)?;
//!     let template = JobTemplate::new("gpu", gpu, "48:00".parse()?);
//!
//!     let scheduler = LsfScheduler::default();
//!     let submission = scheduler.submit(&template.spec_for("diabetes")?).await?;
//!
//!     println!("Submitted job {:?}", submission.job_id);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod local;
pub mod lsf;
mod dry_run;
mod response;

pub use dry_run::DryRunScheduler;
pub use error::{Result, SchedulerError};
pub use local::{JobReport, LocalScheduler};
pub use lsf::{DEFAULT_BSUB, LsfScheduler};
pub use response::{SubmitResponse, parse_submit_response};

use async_trait::async_trait;
use dispatch_core::domain::{JobSpec, Submission};

/// A batch system jobs can be submitted to
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Short backend name shown in output
    fn name(&self) -> &'static str;

    /// Submits one job
    ///
    /// # Errors
    /// Returns `SchedulerError::Rejected` when the scheduler refuses the job.
    /// Failures of the downstream program are never reported here.
    async fn submit(&self, spec: &JobSpec) -> Result<Submission>;

    /// Waits for work the backend still owns before the process exits
    ///
    /// Real schedulers own their jobs, so the default does nothing.
    async fn drain(&self) {}
}
