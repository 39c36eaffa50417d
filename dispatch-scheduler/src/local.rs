//! Local backend
//!
//! Runs the job's command directly on this host, for workstations without
//! LSF. There is no container and no GPU binding; what it keeps from the
//! scheduler contract is the log handling and the run limit:
//! - stdout and stderr are appended to the output log, `%J` being the pid
//! - the process is killed once it exceeds its wall-clock limit
//! - a short job report with the exit status is appended when it ends
//!
//! Submission returns as soon as the process has started. Call
//! `Scheduler::drain` to wait for running jobs before exiting.

use async_trait::async_trait;
use dispatch_core::SpecError;
use dispatch_core::domain::{JobId, JobSpec, Submission};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::Scheduler;
use crate::error::{Result, SchedulerError};

/// How a locally run job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobReport {
    /// Process exited with this code
    Exited(i32),
    /// Process was terminated by a signal
    Signaled,
    /// Process was killed after exceeding its run limit
    RunLimit(Duration),
    /// Waiting on the process failed
    Lost,
}

impl JobReport {
    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => JobReport::Exited(code),
            None => JobReport::Signaled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobReport::Exited(0))
    }

    /// Closing line written to the job's log
    pub fn summary(&self) -> String {
        match self {
            JobReport::Exited(0) => "Successfully completed.".to_string(),
            JobReport::Exited(code) => format!("Exited with exit code {}.", code),
            JobReport::Signaled => "Terminated by a signal.".to_string(),
            JobReport::RunLimit(limit) => format!(
                "TERM_RUNLIMIT: job killed after reaching its run time limit of {}s.",
                limit.as_secs()
            ),
            JobReport::Lost => "Lost track of the job process.".to_string(),
        }
    }
}

/// Scheduler backend that runs jobs as local child processes
#[derive(Debug, Default)]
pub struct LocalScheduler {
    max_run_time: Option<Duration>,
    running: Mutex<Vec<JoinHandle<JobReport>>>,
}

impl LocalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps every job's run time below its own wall-clock limit
    pub fn with_max_run_time(mut self, limit: Duration) -> Self {
        self.max_run_time = Some(limit);
        self
    }

    fn run_limit(&self, spec: &JobSpec) -> Duration {
        let limit = spec.wall_clock.as_duration();
        match self.max_run_time {
            Some(cap) => limit.min(cap),
            None => limit,
        }
    }

    fn track(&self, handle: JoinHandle<JobReport>) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.push(handle);
    }

    /// Waits for every job started so far and returns how each ended
    pub async fn wait(&self) -> Vec<JobReport> {
        let handles = {
            let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *running)
        };

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            reports.push(handle.await.unwrap_or(JobReport::Lost));
        }
        reports
    }
}

#[async_trait]
impl Scheduler for LocalScheduler {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn submit(&self, spec: &JobSpec) -> Result<Submission> {
        let command = spec.command();
        let (program, args) = command
            .split_first()
            .ok_or(SchedulerError::Spec(SpecError::Empty("program")))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SchedulerError::Unavailable {
                program: program.clone(),
                source,
            })?;

        let pid = child.id().ok_or_else(|| {
            SchedulerError::UnexpectedResponse("process exited before reporting a pid".to_string())
        })?;
        let job_id = JobId(u64::from(pid));
        let log_path = spec.output_log.resolve(job_id);

        let (out, err) = match open_log(&log_path).await {
            Ok(files) => files,
            Err(e) => {
                let _ = child.start_kill();
                return Err(e);
            }
        };

        let limit = self.run_limit(spec);
        let job_name = spec.job_name.clone();
        let report_path = log_path.clone();

        info!(
            "Job {} ({}) started locally as <{}>, logging to {}",
            spec.job_name,
            spec.dataset,
            job_id,
            log_path.display()
        );

        let handle = tokio::spawn(async move {
            let report = supervise(&mut child, out, err, limit).await;

            if report.is_success() {
                info!("Local job {} <{}>: {}", job_name, job_id, report.summary());
            } else {
                warn!("Local job {} <{}>: {}", job_name, job_id, report.summary());
            }

            if let Err(e) = append_report(&report_path, job_id, &job_name, &report).await {
                warn!(
                    "Failed to write job report to {}: {}",
                    report_path.display(),
                    e
                );
            }

            report
        });
        self.track(handle);

        Ok(Submission {
            job_id: Some(job_id),
            job_name: spec.job_name.clone(),
            queue: spec.queue.clone(),
            dataset: spec.dataset.clone(),
            log_path: Some(log_path),
            backend: self.name(),
            submitted_at: chrono::Utc::now(),
        })
    }

    async fn drain(&self) {
        let reports = self.wait().await;
        debug!("Drained {} local job(s)", reports.len());
    }
}

/// Opens the log in append mode, once for stdout and once for stderr
async fn open_log(path: &Path) -> Result<(File, File)> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let err = out.try_clone().await?;

    Ok((out, err))
}

/// Streams output into the log until the process ends or hits its limit
async fn supervise(child: &mut Child, out: File, err: File, limit: Duration) -> JobReport {
    let outcome = tokio::time::timeout(limit, run_to_completion(child, out, err)).await;

    match outcome {
        Ok(Ok(status)) => JobReport::from_status(status),
        Ok(Err(e)) => {
            warn!("Failed to wait for local job: {}", e);
            JobReport::Lost
        }
        Err(_) => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill local job after run limit: {}", e);
            }
            JobReport::RunLimit(limit)
        }
    }
}

async fn run_to_completion(
    child: &mut Child,
    mut out: File,
    mut err: File,
) -> std::io::Result<ExitStatus> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let copy_out = async {
        match stdout {
            Some(mut stdout) => tokio::io::copy(&mut stdout, &mut out).await,
            None => Ok(0),
        }
    };
    let copy_err = async {
        match stderr {
            Some(mut stderr) => tokio::io::copy(&mut stderr, &mut err).await,
            None => Ok(0),
        }
    };

    let (copied_out, copied_err) = tokio::join!(copy_out, copy_err);
    copied_out?;
    copied_err?;

    child.wait().await
}

async fn append_report(
    path: &Path,
    job_id: JobId,
    job_name: &str,
    report: &JobReport,
) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path).await?;
    let text = format!(
        "\n------------------------------------------------------------\n\
         Job <{}> ({}) run by the local backend\n\
         {}\n",
        job_id,
        job_name,
        report.summary()
    );
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}
