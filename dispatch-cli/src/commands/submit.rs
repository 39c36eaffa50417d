//! Submit command handler
//!
//! Every dataset becomes its own job. A rejected submission does not stop
//! the remaining ones; the command fails at the end if any were rejected.

use anyhow::{Result, bail};
use colored::*;
use dispatch_core::domain::{JobSpec, Submission};
use dispatch_core::render::shell_join;
use dispatch_scheduler::{DEFAULT_BSUB, DryRunScheduler, Scheduler, SchedulerError};
use tracing::info;

use super::warn_if_unlisted;
use crate::config::Config;

/// Outcome of submitting a batch of jobs
#[derive(Debug, Default)]
pub struct BatchReport {
    pub accepted: Vec<Submission>,
    pub failed: Vec<(String, SchedulerError)>,
}

/// Handle `dispatch submit`
pub async fn handle_submit(datasets: &[String], config: &Config) -> Result<()> {
    let template = config.load_template()?;

    let specs = if datasets.is_empty() {
        template.expand()?
    } else {
        for dataset in datasets {
            warn_if_unlisted(&template, dataset);
        }
        template.specs_for(datasets)?
    };

    if specs.is_empty() {
        bail!(
            "No datasets to submit: list them under 'datasets' in {} or pass --dataset",
            config.definition.display()
        );
    }

    let scheduler = config.scheduler();
    info!(
        "Submitting {} job(s) with the {} backend",
        specs.len(),
        scheduler.name()
    );

    let report = submit_all(scheduler.as_ref(), &specs).await;
    scheduler.drain().await;

    println!();
    if report.failed.is_empty() {
        println!(
            "{}",
            format!("✓ {} job(s) submitted", report.accepted.len())
                .green()
                .bold()
        );
        Ok(())
    } else {
        println!(
            "{}",
            format!(
                "✗ {} of {} submission(s) rejected",
                report.failed.len(),
                specs.len()
            )
            .red()
            .bold()
        );
        bail!("{} submission(s) failed", report.failed.len())
    }
}

/// Submits each spec in order, printing the result as it arrives
pub async fn submit_all(scheduler: &dyn Scheduler, specs: &[JobSpec]) -> BatchReport {
    let mut report = BatchReport::default();

    for spec in specs {
        match scheduler.submit(spec).await {
            Ok(submission) => {
                print_submission(&submission, spec);
                report.accepted.push(submission);
            }
            Err(e) => {
                print_rejection(spec, &e);
                report.failed.push((spec.dataset.clone(), e));
            }
        }
    }

    report
}

/// Command line a dry run stands in for
fn bsub_command_line(spec: &JobSpec) -> String {
    let mut command = vec![DEFAULT_BSUB.to_string()];
    command.extend(spec.bsub_args());
    shell_join(&command)
}

fn print_submission(submission: &Submission, spec: &JobSpec) {
    let job_id = match submission.job_id {
        Some(id) => format!("<{}>", id),
        None => "(not submitted)".to_string(),
    };

    println!(
        "  {} {} {}",
        "▸".cyan(),
        submission.dataset.bold(),
        job_id.dimmed()
    );
    println!("    Job name: {}", submission.job_name);
    println!("    Queue:    {}", submission.queue);
    if let Some(log_path) = &submission.log_path {
        println!("    Log:      {}", log_path.display().to_string().cyan());
    }
    if submission.backend == DryRunScheduler::NAME {
        println!("    Command:  {}", bsub_command_line(spec).dimmed());
    }
}

fn print_rejection(spec: &JobSpec, error: &SchedulerError) {
    println!("  {} {} {}", "✗".red(), spec.dataset.bold(), "rejected".red());
    println!("    {}", error.to_string().dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dispatch_core::domain::{GpuMode, GpuRequest, JobId, JobTemplate};
    use crate::config::Backend;
    use std::path::{Path, PathBuf};

    /// Rejects one dataset and accepts everything else
    struct PickyScheduler {
        reject_dataset: &'static str,
    }

    #[async_trait]
    impl Scheduler for PickyScheduler {
        fn name(&self) -> &'static str {
            "picky"
        }

        async fn submit(&self, spec: &JobSpec) -> dispatch_scheduler::Result<Submission> {
            if spec.dataset == self.reject_dataset {
                return Err(SchedulerError::rejected(
                    &spec.job_name,
                    255,
                    "Bad resource requirement syntax. Job not submitted.",
                ));
            }
            Ok(Submission {
                job_id: Some(JobId(1)),
                job_name: spec.job_name.clone(),
                queue: spec.queue.clone(),
                dataset: spec.dataset.clone(),
                log_path: None,
                backend: self.name(),
                submitted_at: chrono::Utc::now(),
            })
        }
    }

    fn specs() -> Vec<JobSpec> {
        let gpu = GpuRequest::new(1, GpuMode::ExclusiveProcess, None).unwrap();
        let mut template = JobTemplate::new("gpu", gpu, "48:00".parse().unwrap());
        template.datasets = vec!["hypothyroid".to_string(), "diabetes".to_string()];
        template.expand().unwrap()
    }

    #[tokio::test]
    async fn test_rejection_does_not_stop_batch() {
        let scheduler = PickyScheduler {
            reject_dataset: "hypothyroid",
        };

        let report = submit_all(&scheduler, &specs()).await;

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].dataset, "diabetes");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "hypothyroid");
        assert!(report.failed[0].1.is_rejection());
    }

    #[tokio::test]
    async fn test_all_datasets_submitted() {
        let scheduler = DryRunScheduler::new();

        let report = submit_all(&scheduler, &specs()).await;

        assert!(report.failed.is_empty());
        let datasets: Vec<&str> = report.accepted.iter().map(|s| s.dataset.as_str()).collect();
        assert_eq!(datasets, vec!["hypothyroid", "diabetes"]);
        assert_eq!(scheduler.recorded().len(), 2);
    }

    #[test]
    fn test_dry_run_command_line() {
        let spec = specs().remove(1);
        assert_eq!(
            bsub_command_line(&spec),
            "bsub -J diabetes -q gpu -gpu num=1:mode=exclusive_process -W 48:00 \
             -o logs/diabetes.%J.log python -m src.main --data_name diabetes"
        );
    }

    /// Fake bsub that rejects the hypothyroid job and accepts the rest,
    /// appending each accepted dataset to `submitted.txt`
    #[cfg(unix)]
    fn fake_bsub(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("bsub");
        std::fs::write(
            &path,
            r#"#!/bin/sh
for last; do :; done
if [ "$last" = "hypothyroid" ]; then
    echo "Bad resource requirement syntax. Job not submitted." >&2
    exit 255
fi
echo "$last" >> "$(dirname "$0")/submitted.txt"
echo "Job <42> is submitted to queue <gpu>."
"#,
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn lsf_config(dir: &Path, datasets: &str) -> Config {
        let definition = dir.join("jobs.lua");
        std::fs::write(
            &definition,
            format!(
                r#"return {{
                    queue = "gpu",
                    wall_clock = "48:00",
                    output = "{}/logs/{{dataset}}.%J.log",
                    datasets = {{ {} }},
                }}"#,
                dir.display(),
                datasets
            ),
        )
        .unwrap();

        Config {
            definition,
            backend: Backend::Lsf,
            bsub: fake_bsub(dir),
        }
    }

    #[cfg(unix)]
    fn submitted(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("submitted.txt"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_handle_submit_fails_after_submitting_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let config = lsf_config(dir.path(), r#""hypothyroid", "diabetes""#);

        let err = handle_submit(&[], &config).await.unwrap_err();

        assert!(err.to_string().contains("1 submission(s) failed"), "{}", err);
        assert_eq!(submitted(dir.path()), vec!["diabetes"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_handle_submit_accepts_unlisted_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config = lsf_config(dir.path(), r#""hypothyroid", "diabetes""#);

        handle_submit(&["unlisted_set".to_string()], &config)
            .await
            .unwrap();

        assert_eq!(submitted(dir.path()), vec!["unlisted_set"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_handle_submit_without_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let config = lsf_config(dir.path(), "");

        let err = handle_submit(&[], &config).await.unwrap_err();

        assert!(err.to_string().contains("No datasets to submit"), "{}", err);
        assert!(submitted(dir.path()).is_empty());
    }
}
