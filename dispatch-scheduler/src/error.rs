//! Error types for scheduler backends

use dispatch_core::SpecError;
use thiserror::Error;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur while handing a job to a scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler refused the submission (malformed directives, unknown
    /// queue, unavailable GPU model, ...)
    #[error("scheduler rejected job '{job_name}' (exit code {exit_code}): {message}")]
    Rejected {
        /// Name of the rejected job
        job_name: String,
        /// Exit code of the submission command
        exit_code: i32,
        /// Message printed by the scheduler
        message: String,
    },

    /// Submission command could not be started
    #[error("failed to run '{program}': {source}")]
    Unavailable {
        /// Program that was invoked
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// Submission succeeded but the reply could not be understood
    #[error("unexpected scheduler response: {0}")]
    UnexpectedResponse(String),

    /// Local filesystem error (log directory, log file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job could not be turned into a command line
    #[error("invalid job: {0}")]
    Spec(#[from] SpecError),
}

impl SchedulerError {
    /// Create a rejection error from the command's exit code and output
    pub fn rejected(job_name: impl Into<String>, exit_code: i32, message: impl Into<String>) -> Self {
        Self::Rejected {
            job_name: job_name.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Check if the scheduler itself refused the job
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Check if the scheduler could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
