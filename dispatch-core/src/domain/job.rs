//! Job specification

use serde::Serialize;

use super::gpu::GpuRequest;
use super::log_path::LogPath;
use super::wall_clock::WallClock;
use crate::render::{self, Directive};

/// Flag the downstream program reads the dataset identifier from
pub const DATA_NAME_FLAG: &str = "--data_name";

/// Everything the scheduler needs to run one dataset through the analysis program
///
/// Built once per submission and dropped afterwards. The dataset identifier is
/// forwarded verbatim; recognising it is the downstream program's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    pub job_name: String,
    pub queue: String,
    pub gpu: GpuRequest,
    pub wall_clock: WallClock,
    pub output_log: LogPath,
    pub container_image: Option<String>,
    pub notify: bool,
    pub program: Vec<String>,
    pub dataset: String,
}

impl JobSpec {
    /// Command line executed inside the allocation
    pub fn command(&self) -> Vec<String> {
        let mut command = self.program.clone();
        command.push(DATA_NAME_FLAG.to_string());
        command.push(self.dataset.clone());
        command
    }

    /// Scheduler directives in submission order
    pub fn directives(&self) -> Vec<Directive> {
        let mut directives = vec![
            Directive::with_value("-J", &self.job_name),
            Directive::with_value("-q", &self.queue),
            Directive::with_value("-gpu", self.gpu.resource_string()),
            Directive::with_value("-W", self.wall_clock.to_string()),
            Directive::with_value("-o", self.output_log.template()),
        ];

        if let Some(image) = &self.container_image {
            directives.push(Directive::with_value("-a", format!("docker({})", image)));
        }

        if self.notify {
            directives.push(Directive::flag("-N"));
        }

        directives
    }

    /// Arguments for `bsub`, directives first and the command last
    pub fn bsub_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .directives()
            .into_iter()
            .flat_map(Directive::into_args)
            .collect();
        args.extend(self.command());
        args
    }

    /// Batch script equivalent to `bsub_args`, suitable for `bsub < script`
    pub fn to_script(&self) -> String {
        let mut script = String::from("#!/bin/bash\n");
        for directive in self.directives() {
            script.push_str("#BSUB ");
            script.push_str(&directive.to_script_line());
            script.push('\n');
        }
        script.push('\n');
        script.push_str(&render::shell_join(&self.command()));
        script.push('\n');
        script
    }
}
