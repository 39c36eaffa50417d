//! Configuration module
//!
//! Global CLI settings: which definition file to read and which backend
//! receives the jobs.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use dispatch_core::domain::JobTemplate;
use dispatch_lua::parse_job_definition;
use dispatch_scheduler::{DryRunScheduler, LocalScheduler, LsfScheduler, Scheduler};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Scheduler backend selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Submit with bsub
    Lsf,
    /// Run on this machine
    Local,
    /// Print the bsub command lines only
    DryRun,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Lsf => "lsf",
            Backend::Local => "local",
            Backend::DryRun => "dry-run",
        };
        write!(f, "{}", name)
    }
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Lua job definition file
    pub definition: PathBuf,

    /// Backend that receives submissions
    pub backend: Backend,

    /// bsub executable used by the LSF backend
    pub bsub: PathBuf,
}

impl Config {
    /// Rejects settings no command could work with
    pub fn validate(&self) -> Result<()> {
        if self.definition.as_os_str().is_empty() {
            bail!("Definition path must not be empty");
        }
        if self.backend == Backend::Lsf && self.bsub.as_os_str().is_empty() {
            bail!("bsub path must not be empty");
        }
        Ok(())
    }

    /// Reads and evaluates the job definition
    pub fn load_template(&self) -> Result<JobTemplate> {
        let source = std::fs::read_to_string(&self.definition).with_context(|| {
            format!(
                "Failed to read job definition {} (create one with `dispatch init`)",
                self.definition.display()
            )
        })?;

        debug!("Loading job definition from {}", self.definition.display());

        parse_job_definition(&source)
            .with_context(|| format!("Invalid job definition {}", self.definition.display()))
    }

    /// Builds the configured scheduler backend
    pub fn scheduler(&self) -> Box<dyn Scheduler> {
        match self.backend {
            Backend::Lsf => Box::new(LsfScheduler::new(&self.bsub)),
            Backend::Local => Box::new(LocalScheduler::new()),
            Backend::DryRun => Box::new(DryRunScheduler::new()),
        }
    }
}
