use super::request::SchedulerRequest;
use crate::command::WorkerCommand;
use crate::error::{DispatchError, ErrorCode, Result};
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

static JOB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").expect("Valid regex pattern"));

/// A job accepted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterJob {
    pub job_id: u64,
    pub jobname: String,
}

/// First integer token in the scheduler's reply.
///
/// Both `Job <123> is submitted to queue <normal>.` and
/// `Submitted batch job 123` yield 123. When several candidates are present
/// the first wins and a warning is logged.
pub fn parse_job_id(output: &str) -> Result<u64> {
    let candidates: Vec<&str> = JOB_ID_RE.find_iter(output).map(|m| m.as_str()).collect();

    let Some(first) = candidates.first() else {
        return Err(DispatchError::scheduler_output(
            ErrorCode::SCHED_NO_JOB_ID,
            "No job id found in scheduler output",
            Some(output.to_string()),
        ));
    };

    if candidates.len() > 1 {
        warn!(
            "Several numbers that could be a job id were found in scheduler output, using {}: {}",
            first,
            output.trim()
        );
    }

    first.parse().map_err(|e| {
        DispatchError::scheduler_output(
            ErrorCode::SCHED_NO_JOB_ID,
            format!("Job id '{}' is out of range", first),
            Some(output.to_string()),
        )
        .with_source(e)
    })
}

/// Submits rendered requests through the scheduler CLI.
pub struct ClusterSubmitter {
    runner: Arc<dyn ProcessRunner>,
}

impl ClusterSubmitter {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Blocks until the scheduler CLI returns, not until the job finishes.
    pub async fn submit(
        &self,
        request: &SchedulerRequest,
        command: &WorkerCommand,
    ) -> Result<ClusterJob> {
        let argv = request.render(command);
        debug!("Cluster command: {}", argv.join(" "));

        let program = request.kind.program();
        let process = ProcessCommandBuilder::new(program)
            .args(argv.iter().skip(1))
            .build();

        let output = self.runner.run(process).await.map_err(|e| {
            DispatchError::scheduler_output(
                ErrorCode::SCHED_SUBMIT_FAILED,
                format!("Could not run {}", program),
                None,
            )
            .with_source(e)
        })?;

        let text = output.combined();
        debug!("Output of the cluster command: {}", text.trim());

        if !output.status.success() {
            return Err(DispatchError::scheduler_output(
                ErrorCode::SCHED_SUBMIT_FAILED,
                format!("{} for {} finished with {}", program, request.jobname, output.status),
                Some(text),
            ));
        }

        let job_id = parse_job_id(&text)?;
        info!("Submitted {} as job {}", request.jobname, job_id);

        Ok(ClusterJob {
            job_id,
            jobname: request.jobname.clone(),
        })
    }
}
