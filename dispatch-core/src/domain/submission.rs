//! Submission record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier the scheduler assigns to an accepted job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of handing a job to a scheduler backend
///
/// Acceptance says nothing about how the downstream program fares; that
/// only shows up in the log.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    /// Scheduler job id, absent for dry runs
    pub job_id: Option<JobId>,
    pub job_name: String,
    pub queue: String,
    pub dataset: String,
    /// Log path with the job id substituted, when known
    pub log_path: Option<PathBuf>,
    /// Backend that accepted the job
    pub backend: &'static str,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}
