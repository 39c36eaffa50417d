//! LSF backend
//!
//! Submits each job with a single `bsub` invocation. Directives and the
//! command are passed as arguments, so no shell is involved and dataset
//! identifiers reach the downstream program exactly as given.

use async_trait::async_trait;
use dispatch_core::domain::{JobSpec, Submission};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::Scheduler;
use crate::error::{Result, SchedulerError};
use crate::response::parse_submit_response;

/// Default submission command, resolved through `PATH`
pub const DEFAULT_BSUB: &str = "bsub";

/// Scheduler backend that shells out to `bsub`
#[derive(Debug, Clone)]
pub struct LsfScheduler {
    bsub: PathBuf,
}

impl LsfScheduler {
    /// Creates a backend using the given `bsub` executable
    pub fn new(bsub: impl Into<PathBuf>) -> Self {
        Self { bsub: bsub.into() }
    }

    pub fn bsub(&self) -> &Path {
        &self.bsub
    }
}

impl Default for LsfScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BSUB)
    }
}

#[async_trait]
impl Scheduler for LsfScheduler {
    fn name(&self) -> &'static str {
        "lsf"
    }

    async fn submit(&self, spec: &JobSpec) -> Result<Submission> {
        // LSF does not create the log directory and drops output if it is missing
        if let Some(dir) = spec.output_log.parent_dir() {
            tokio::fs::create_dir_all(&dir).await?;
        }
        if spec.output_log.has_job_id_dir() {
            warn!(
                "Log directory of {} depends on the job id and cannot be created in advance",
                spec.output_log
            );
        }

        let args = spec.bsub_args();
        debug!("Running {} {:?}", self.bsub.display(), args);

        let output = Command::new(&self.bsub)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SchedulerError::Unavailable {
                program: self.bsub.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.trim().is_empty() {
            debug!("bsub stderr: {}", stderr.trim());
        }

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let message = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };

            error!(
                "bsub rejected job {} (exit_code={}): {}",
                spec.job_name, exit_code, message
            );
            return Err(SchedulerError::rejected(&spec.job_name, exit_code, message));
        }

        // Some sites print the confirmation on stderr
        let response = parse_submit_response(&stdout)
            .or_else(|| parse_submit_response(&stderr))
            .ok_or_else(|| SchedulerError::UnexpectedResponse(stdout.trim().to_string()))?;

        let queue = response.queue.unwrap_or_else(|| spec.queue.clone());
        info!(
            "Job {} ({}) submitted as <{}> to queue {}",
            spec.job_name, spec.dataset, response.job_id, queue
        );

        Ok(Submission {
            job_id: Some(response.job_id),
            job_name: spec.job_name.clone(),
            queue,
            dataset: spec.dataset.clone(),
            log_path: Some(spec.output_log.resolve(response.job_id)),
            backend: self.name(),
            submitted_at: chrono::Utc::now(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use dispatch_core::domain::{GpuMode, GpuRequest, JobId, LogPath};
    use std::os::unix::fs::PermissionsExt;

    /// Writes an executable shell script standing in for `bsub`
    fn fake_bsub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("bsub");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn spec(dataset: &str, log_dir: &Path) -> JobSpec {
        JobSpec {
            job_name: dataset.to_string(),
            queue: "gpu".to_string(),
            gpu: GpuRequest::new(1, GpuMode::ExclusiveProcess, None).unwrap(),
            wall_clock: "48:00".parse().unwrap(),
            output_log: LogPath::new(format!("{}/{}.%J.log", log_dir.display(), dataset)),
            container_image: None,
            notify: false,
            program: vec!["python".into(), "-m".into(), "src.main".into()],
            dataset: dataset.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let bsub = fake_bsub(
            dir.path(),
            r#"printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
echo "Job <4211> is submitted to queue <gpu>.""#,
        );
        let log_dir = dir.path().join("logs");

        let scheduler = LsfScheduler::new(&bsub);
        let submission = scheduler.submit(&spec("diabetes", &log_dir)).await.unwrap();

        assert_eq!(submission.job_id, Some(JobId(4211)));
        assert_eq!(submission.queue, "gpu");
        assert_eq!(submission.backend, "lsf");
        assert_eq!(
            submission.log_path,
            Some(log_dir.join("diabetes.4211.log"))
        );
        assert!(log_dir.is_dir());

        let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(&args[args.len() - 2..], &["--data_name", "diabetes"]);
        assert!(args.contains(&"num=1:mode=exclusive_process"));
    }

    #[tokio::test]
    async fn test_log_dir_with_job_id_is_not_created_literally() {
        let dir = tempfile::tempdir().unwrap();
        let bsub = fake_bsub(dir.path(), r#"echo "Job <31> is submitted to queue <gpu>.""#);
        let mut job = spec("diabetes", dir.path());
        job.output_log = LogPath::new(format!("{}/logs/%J/diabetes.log", dir.path().display()));

        let submission = LsfScheduler::new(&bsub).submit(&job).await.unwrap();

        assert!(dir.path().join("logs").is_dir());
        assert!(!dir.path().join("logs").join("%J").exists());
        assert_eq!(
            submission.log_path,
            Some(dir.path().join("logs").join("31").join("diabetes.log"))
        );
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_still_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let bsub = fake_bsub(dir.path(), r#"echo "Job <5> is submitted to queue <gpu>.""#);

        let submission = LsfScheduler::new(&bsub)
            .submit(&spec("not_a_real_dataset", dir.path()))
            .await
            .unwrap();

        assert_eq!(submission.dataset, "not_a_real_dataset");
        assert_eq!(submission.job_id, Some(JobId(5)));
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bsub = fake_bsub(
            dir.path(),
            r#"echo "gpu: No such queue. Job not submitted." >&2
exit 255"#,
        );

        let err = LsfScheduler::new(&bsub)
            .submit(&spec("hypothyroid", dir.path()))
            .await
            .unwrap_err();

        match err {
            SchedulerError::Rejected {
                job_name,
                exit_code,
                message,
            } => {
                assert_eq!(job_name, "hypothyroid");
                assert_eq!(exit_code, 255);
                assert_eq!(message, "gpu: No such queue. Job not submitted.");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_bsub() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = LsfScheduler::new(dir.path().join("no-such-bsub"));

        let err = scheduler
            .submit(&spec("diabetes", dir.path()))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_unparseable_reply() {
        let dir = tempfile::tempdir().unwrap();
        let bsub = fake_bsub(dir.path(), r#"echo "all good""#);

        let err = LsfScheduler::new(&bsub)
            .submit(&spec("diabetes", dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::UnexpectedResponse(ref s) if s == "all good"));
    }
}
