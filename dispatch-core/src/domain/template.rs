//! Job template shared by every dataset in a definition

use serde::Serialize;
use std::collections::HashSet;

use super::gpu::GpuRequest;
use super::job::JobSpec;
use super::log_path::LogPath;
use super::wall_clock::WallClock;
use crate::error::SpecError;

/// Placeholder expanded to the dataset identifier in name and log templates
pub const DATASET_PLACEHOLDER: &str = "{dataset}";

pub const DEFAULT_JOB_NAME: &str = "{dataset}";
pub const DEFAULT_OUTPUT_LOG: &str = "logs/{dataset}.%J.log";

/// Default downstream invocation, `python -m src.main`
pub fn default_program() -> Vec<String> {
    vec!["python".to_string(), "-m".to_string(), "src.main".to_string()]
}

/// Resource directives plus the datasets they are submitted for
///
/// One definition file yields one template; each dataset becomes its own
/// independent `JobSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobTemplate {
    pub job_name: String,
    pub queue: String,
    pub gpu: GpuRequest,
    pub wall_clock: WallClock,
    pub output_log: String,
    pub container_image: Option<String>,
    pub notify: bool,
    pub program: Vec<String>,
    pub datasets: Vec<String>,
}

impl JobTemplate {
    /// Creates a template with the default name, log path and program
    pub fn new(queue: impl Into<String>, gpu: GpuRequest, wall_clock: WallClock) -> Self {
        Self {
            job_name: DEFAULT_JOB_NAME.to_string(),
            queue: queue.into(),
            gpu,
            wall_clock,
            output_log: DEFAULT_OUTPUT_LOG.to_string(),
            container_image: None,
            notify: false,
            program: default_program(),
            datasets: Vec::new(),
        }
    }

    /// Whether the dataset is listed in this template
    pub fn lists(&self, dataset: &str) -> bool {
        self.datasets.iter().any(|d| d == dataset)
    }

    /// Builds the job for a single dataset
    ///
    /// Any identifier is accepted, listed or not; only an empty one is
    /// refused since it cannot form a `--data_name` argument.
    pub fn spec_for(&self, dataset: &str) -> Result<JobSpec, SpecError> {
        if dataset.trim().is_empty() {
            return Err(SpecError::Empty("dataset"));
        }
        if self.queue.trim().is_empty() {
            return Err(SpecError::Empty("queue"));
        }
        if self.program.is_empty() || self.program[0].trim().is_empty() {
            return Err(SpecError::Empty("program"));
        }

        let job_name = expand(&self.job_name, dataset);
        if job_name.trim().is_empty() {
            return Err(SpecError::Empty("job_name"));
        }

        let output_log = expand(&self.output_log, dataset);
        if output_log.trim().is_empty() {
            return Err(SpecError::Empty("output"));
        }

        Ok(JobSpec {
            job_name,
            queue: self.queue.clone(),
            gpu: self.gpu.clone(),
            wall_clock: self.wall_clock,
            output_log: LogPath::new(output_log),
            container_image: self.container_image.clone(),
            notify: self.notify,
            program: self.program.clone(),
            dataset: dataset.to_string(),
        })
    }

    /// Builds one job per listed dataset
    pub fn expand(&self) -> Result<Vec<JobSpec>, SpecError> {
        self.specs_for(&self.datasets)
    }

    /// Builds one job per given dataset, refusing colliding names or log paths
    pub fn specs_for<S: AsRef<str>>(&self, datasets: &[S]) -> Result<Vec<JobSpec>, SpecError> {
        let mut names = HashSet::new();
        let mut logs = HashSet::new();
        let mut specs = Vec::with_capacity(datasets.len());

        for dataset in datasets {
            let spec = self.spec_for(dataset.as_ref())?;

            if !names.insert(spec.job_name.clone()) {
                return Err(SpecError::DuplicateJobName(spec.job_name));
            }
            if !logs.insert(spec.output_log.clone()) {
                return Err(SpecError::DuplicateLogPath(spec.output_log.to_string()));
            }

            specs.push(spec);
        }

        Ok(specs)
    }
}

fn expand(template: &str, dataset: &str) -> String {
    template.replace(DATASET_PLACEHOLDER, dataset)
}
