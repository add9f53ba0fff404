//! Concurrency-capped local execution of worker processes.

use crate::error::{DispatchError, ErrorCode};
use crate::orchestrator::report::{UnitOutcome, UnitStatus};
use crate::subprocess::{ExitStatus, ProcessCommand, ProcessHandle, ProcessRunner};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One worker process to run locally.
#[derive(Debug, Clone)]
pub struct LocalJob {
    pub label: String,
    pub command: ProcessCommand,
}

impl LocalJob {
    pub fn new(label: impl Into<String>, command: ProcessCommand) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }
}

#[derive(Debug, Default)]
pub struct LocalRunReport {
    pub outcomes: Vec<UnitOutcome>,
    /// Largest number of processes started and not yet reaped.
    pub peak_concurrency: usize,
}

impl LocalRunReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// Runs jobs in batches of at most `max_parallel` processes.
///
/// Once a batch is full every process in it is awaited before the next
/// batch starts. A job that fails to launch does not take a slot.
pub struct LocalExecutor {
    runner: Arc<dyn ProcessRunner>,
    max_parallel: usize,
}

impl LocalExecutor {
    pub fn new(runner: Arc<dyn ProcessRunner>, max_parallel: usize) -> Self {
        Self {
            runner,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Returns only after every launched process has exited.
    pub async fn run(&self, jobs: Vec<LocalJob>) -> LocalRunReport {
        let total = jobs.len();
        info!(
            "Running {} process(es), {} at a time",
            total, self.max_parallel
        );

        let mut report = LocalRunReport::default();
        let mut window: Vec<(String, ProcessHandle)> = Vec::with_capacity(self.max_parallel);

        for job in jobs {
            match self.runner.spawn(&job.command) {
                Ok(handle) => {
                    info!("Starting {}", job.label);
                    window.push((job.label, handle));
                    report.peak_concurrency = report.peak_concurrency.max(window.len());
                }
                Err(e) => {
                    error!("Error with the process {}: {}", job.command.display(), e);
                    report
                        .outcomes
                        .push(UnitOutcome::new(job.label, Err(DispatchError::from(e))));
                    continue;
                }
            }

            if window.len() == self.max_parallel {
                report.outcomes.extend(Self::wait_all(&mut window).await);
                debug!("Finished process set");
            }
        }

        report.outcomes.extend(Self::wait_all(&mut window).await);
        info!(
            "Finished all {} process(es), {} failed",
            total,
            report.failures()
        );
        report
    }

    async fn wait_all(window: &mut Vec<(String, ProcessHandle)>) -> Vec<UnitOutcome> {
        let waits = window.drain(..).map(|(label, handle)| async move {
            let status = handle.wait().await;
            (label, status)
        });

        join_all(waits)
            .await
            .into_iter()
            .map(|(label, status)| {
                let result = match status {
                    Ok(ExitStatus::Success) => {
                        debug!("{} completed", label);
                        Ok(UnitStatus::Completed)
                    }
                    Ok(status) => {
                        warn!("{} finished with {}", label, status);
                        Err(exit_failure(&label, &status))
                    }
                    Err(e) => Err(DispatchError::from(e)),
                };
                UnitOutcome::new(label, result)
            })
            .collect()
    }
}

/// Error for a process that ran but did not succeed.
pub fn exit_failure(what: &str, status: &ExitStatus) -> DispatchError {
    let message = format!("{} finished with {}", what, status);
    match status {
        ExitStatus::Signal(_) => {
            DispatchError::worker_failure_with_code(ErrorCode::EXEC_SIGNAL_RECEIVED, message, None)
        }
        _ => DispatchError::worker_failure(message, status.code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::{MockProcessRunner, ProcessCommandBuilder, TokioProcessRunner};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn tokio_runner() -> Arc<dyn ProcessRunner> {
        Arc::new(TokioProcessRunner)
    }

    /// Stub that marks itself alive in `dir` for its whole lifetime.
    fn stub(dir: &Path, i: usize) -> LocalJob {
        let marker = dir.join(format!("alive-{}", i));
        let script = format!(
            "touch '{m}'; sleep 0.05; rm -f '{m}'",
            m = marker.display()
        );
        LocalJob::new(
            format!("stub-{}", i),
            ProcessCommandBuilder::new("sh").args(["-c", &script]).build(),
        )
    }

    async fn sample_peak(max_parallel: usize) -> (LocalRunReport, usize) {
        let dir = TempDir::new().unwrap();
        let jobs: Vec<_> = (0..25).map(|i| stub(dir.path(), i)).collect();

        let stop = Arc::new(AtomicBool::new(false));
        let sampler = {
            let stop = stop.clone();
            let path = dir.path().to_path_buf();
            tokio::spawn(async move {
                let mut peak = 0;
                while !stop.load(Ordering::Relaxed) {
                    let alive = std::fs::read_dir(&path).map(|d| d.count()).unwrap_or(0);
                    peak = peak.max(alive);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
                peak
            })
        };

        let report = LocalExecutor::new(tokio_runner(), max_parallel).run(jobs).await;
        stop.store(true, Ordering::Relaxed);
        let sampled = sampler.await.unwrap();
        (report, sampled)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_cap_is_respected() {
        for n in [1, 3, 10] {
            let (report, sampled) = sample_peak(n).await;
            assert_eq!(report.outcomes.len(), 25);
            assert_eq!(report.failures(), 0, "n = {n}");
            assert!(report.peak_concurrency <= n, "n = {n}");
            assert!(sampled <= n, "sampled {sampled} alive for n = {n}");
        }
    }

    #[tokio::test]
    async fn test_launch_failure_does_not_abort_siblings() {
        let jobs = vec![
            LocalJob::new("ok-1", ProcessCommandBuilder::new("true").build()),
            LocalJob::new(
                "missing",
                ProcessCommandBuilder::new("nonexistent_worker_12345").build(),
            ),
            LocalJob::new("ok-2", ProcessCommandBuilder::new("true").build()),
        ];

        let report = LocalExecutor::new(tokio_runner(), 2).run(jobs).await;
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.peak_concurrency, 2);

        let missing = report
            .outcomes
            .iter()
            .find(|o| o.label == "missing")
            .unwrap();
        let err = missing.result.as_ref().unwrap_err();
        assert_eq!(err.code(), ErrorCode::EXEC_COMMAND_NOT_FOUND);

        assert!(report
            .outcomes
            .iter()
            .filter(|o| o.label.starts_with("ok"))
            .all(UnitOutcome::is_success));
    }

    #[tokio::test]
    async fn test_worker_failure_is_recorded() {
        let jobs = vec![LocalJob::new(
            "bad",
            ProcessCommandBuilder::new("sh").args(["-c", "exit 3"]).build(),
        )];
        let report = LocalExecutor::new(tokio_runner(), 4).run(jobs).await;
        match &report.outcomes[0].result {
            Err(DispatchError::WorkerFailure { exit_code, .. }) => assert_eq!(*exit_code, Some(3)),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signal_is_reported_with_its_own_code() {
        let jobs = vec![LocalJob::new(
            "killed",
            ProcessCommandBuilder::new("sh").args(["-c", "kill -9 $$"]).build(),
        )];
        let report = LocalExecutor::new(tokio_runner(), 1).run(jobs).await;
        let err = report.outcomes[0].result.as_ref().unwrap_err();
        assert_eq!(err.code(), ErrorCode::EXEC_SIGNAL_RECEIVED);
        assert!(matches!(err, DispatchError::WorkerFailure { exit_code: None, .. }));
    }

    #[tokio::test]
    async fn test_scripted_runner_drives_batches() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("worker")
            .with_args(|args| args == ["bad"])
            .returns_exit_code(2)
            .finish();
        mock.expect_command("worker").finish();

        let jobs = ["a", "bad", "c", "d", "e"]
            .iter()
            .map(|name| LocalJob::new(*name, ProcessCommandBuilder::new("worker").arg(name).build()))
            .collect();
        let report = LocalExecutor::new(Arc::new(mock.clone()), 2).run(jobs).await;

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.peak_concurrency, 2);
        assert_eq!(report.failures(), 1);
        let labels: Vec<_> = report.outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["a", "bad", "c", "d", "e"]);
        assert!(mock.verify_called("worker", 5));
    }

    #[tokio::test]
    async fn test_output_goes_to_log_file() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("HR_Analysis_LO001_CO6.out");
        let jobs = vec![LocalJob::new(
            "LO001_CO6",
            ProcessCommandBuilder::new("sh")
                .args(["-c", "echo analysing"])
                .log_file(&log)
                .build(),
        )];

        let report = LocalExecutor::new(tokio_runner(), 1).run(jobs).await;
        assert_eq!(report.failures(), 0);
        assert_eq!(std::fs::read_to_string(&log).unwrap().trim(), "analysing");
    }

    #[tokio::test]
    async fn test_empty_job_list() {
        let report = LocalExecutor::new(tokio_runner(), 0).run(Vec::new()).await;
        assert!(report.outcomes.is_empty());
        assert_eq!(report.peak_concurrency, 0);
    }
}
