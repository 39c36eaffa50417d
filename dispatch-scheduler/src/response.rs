//! Parsing of `bsub` replies
//!
//! A successful submission prints a line such as
//! `Job <4211> is submitted to queue <gpu>.` (or `... to default queue
//! <normal>.`), possibly after warnings from site-specific esub scripts.

use dispatch_core::domain::JobId;

/// Job id and queue extracted from a `bsub` reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub queue: Option<String>,
}

/// Finds the submission line in `bsub` output
pub fn parse_submit_response(output: &str) -> Option<SubmitResponse> {
    output.lines().find_map(parse_line)
}

fn parse_line(line: &str) -> Option<SubmitResponse> {
    let line = line.trim();
    let rest = line.strip_prefix("Job <")?;
    let (id, rest) = rest.split_once('>')?;
    let job_id = JobId(id.trim().parse().ok()?);

    let queue = rest
        .split_once("queue <")
        .and_then(|(_, q)| q.split_once('>'))
        .map(|(q, _)| q.to_string());

    Some(SubmitResponse { job_id, queue })
}
