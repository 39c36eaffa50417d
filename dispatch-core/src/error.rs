//! Error types for job specification values

use thiserror::Error;

/// Errors raised while building or expanding a job specification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// GPU request asked for zero devices
    #[error("GPU count must be at least 1")]
    ZeroGpus,

    /// GPU mode is not one the scheduler understands
    #[error("unknown GPU mode '{0}' (expected exclusive_process or shared)")]
    UnknownGpuMode(String),

    /// Wall-clock limit could not be parsed
    #[error("invalid wall-clock limit '{0}' (expected HH:MM or minutes)")]
    InvalidWallClock(String),

    /// Required field was empty
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Two expanded jobs ended up with the same name
    #[error("job name '{0}' is produced for more than one dataset; add {{dataset}} to the job_name template")]
    DuplicateJobName(String),

    /// Two expanded jobs would write to the same log
    #[error("log path '{0}' is produced for more than one dataset; add {{dataset}} to the output template")]
    DuplicateLogPath(String),
}

impl SpecError {
    /// Check if this error comes from template expansion rather than a bad value
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::DuplicateJobName(_) | Self::DuplicateLogPath(_))
    }
}
