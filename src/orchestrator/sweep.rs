//! Per-directory control flow: plan, dispatch, consolidate.

use super::options::{AnalysisMode, SweepOptions};
use super::report::{DirectoryReport, DirectoryState, RunReport, UnitOutcome, UnitStatus};
use crate::array_index::{detect_array_index, select};
use crate::cluster::{ClusterSubmitter, SchedulerKind, SchedulerRequest};
use crate::command::{CommandBuilder, WorkerCommand, WorkerParams};
use crate::config::DispatchConfig;
use crate::env::EnvironmentView;
use crate::error::{DispatchError, ErrorCode, ErrorExt, Result};
use crate::experiment::{DirectoryResolver, ExperimentDescriptor, ExperimentDirectory, CROPPED_DIR_NAME};
use crate::local::{exit_failure, LocalExecutor, LocalJob};
use crate::plan::{AnalysisUnit, CombinationPlanner};
use crate::subprocess::SubprocessManager;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const CONSOLIDATE_JOB_NAME: &str = "HR_Consolidate";
const CONSOLIDATE_LABEL: &str = "consolidate";

/// Output sub-directories created before dispatch.
pub const LOG_DIR: &str = "log";
pub const RESULTS_DIR: &str = "results";

/// A planned unit and the worker command that analyses it.
struct PreparedUnit {
    unit: AnalysisUnit,
    command: WorkerCommand,
}

pub struct Orchestrator<'a> {
    config: &'a DispatchConfig,
    subprocess: SubprocessManager,
    env: &'a dyn EnvironmentView,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a DispatchConfig,
        subprocess: SubprocessManager,
        env: &'a dyn EnvironmentView,
    ) -> Self {
        Self {
            config,
            subprocess,
            env,
        }
    }

    /// Run the sweep over every resolved directory, or over the single
    /// directory owned by this process when it runs as an array element.
    ///
    /// Only configuration errors abort the run, plus a submission failure
    /// on the last directory. Everything else is recorded in the report.
    pub async fn run(&self, options: &SweepOptions) -> Result<RunReport> {
        let dirs = DirectoryResolver::new().resolve(&options.indir)?;
        let selected = self.select_directories(&dirs)?;

        let mut report = RunReport::default();
        let last = selected.len().saturating_sub(1);

        for (i, dir) in selected.into_iter().enumerate() {
            let mut dir_report = self.process_directory(dir, options).await?;

            match dir_report.error.take() {
                Some(err) if i == last && err.is_scheduler() => return Err(err),
                other => dir_report.error = other,
            }
            report.directories.push(dir_report);
        }

        info!(
            "Dispatched {} unit(s) over {} director(ies): {} unit(s) failed, {} director(ies) failed",
            report.total_units(),
            report.directories.len(),
            report.failed_units(),
            report.failed_directories()
        );
        Ok(report)
    }

    fn select_directories<'d>(
        &self,
        dirs: &'d [ExperimentDirectory],
    ) -> Result<Vec<&'d ExperimentDirectory>> {
        let Some(index) = detect_array_index(self.env) else {
            return Ok(dirs.iter().collect());
        };

        let dir = select(dirs, index).ok_or_else(|| {
            DispatchError::configuration_with_code(
                ErrorCode::CONFIG_INDEX_OUT_OF_RANGE,
                format!(
                    "Array index {} is past the {} resolved director(ies)",
                    index,
                    dirs.len()
                ),
            )
        })?;
        info!("Array element {} processes {}", index, dir.path.display());
        Ok(vec![dir])
    }

    async fn process_directory(
        &self,
        dir: &ExperimentDirectory,
        options: &SweepOptions,
    ) -> Result<DirectoryReport> {
        let output_root = dir.output_root(&options.outdir);
        let mut report = DirectoryReport::new(dir.path.clone(), output_root.clone());

        info!("##### Job dispatching: {} #####", dir.experiment_id);
        debug!("Input directory {}", dir.path.display());
        debug!("Output directory {}", output_root.display());

        match self.drive(dir, &output_root, options, &mut report).await {
            Ok(()) => {
                report.state = DirectoryState::Done;
            }
            Err(err) if err.is_configuration() => {
                error!("{} failed during {}: {}", dir.experiment_id, report.state, err);
                return Err(err.with_context(dir.path.display()));
            }
            Err(err) => {
                error!("{} failed during {}: {}", dir.experiment_id, report.state, err);
                report.state = DirectoryState::Failed;
                report.error = Some(err);
            }
        }
        Ok(report)
    }

    async fn drive(
        &self,
        dir: &ExperimentDirectory,
        output_root: &Path,
        options: &SweepOptions,
        report: &mut DirectoryReport,
    ) -> Result<()> {
        report.state = DirectoryState::Discover;
        if !options.dry_run {
            create_output_layout(output_root)?;
        }
        let descriptor = ExperimentDescriptor::scan(&dir.path)?;
        info!("Deduced number of videos: {}", descriptor.video_count);
        info!(
            "Deduced channels: {}",
            descriptor.channels.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        info!("Deduced number of loops: {}", descriptor.loops.len());

        report.state = DirectoryState::Plan;
        let plan = CombinationPlanner::new().plan(&dir.path, &descriptor, &options.filters)?;

        report.state = DirectoryState::Dispatch;
        let builder = CommandBuilder::new(self.config);
        let script = options.mode.script(self.config);
        let units: Vec<PreparedUnit> = plan
            .units
            .into_iter()
            .map(|unit| {
                let params = self.worker_params(dir, output_root, &unit, options);
                let command = builder.build(script, &params);
                debug!("Worker command for {}: {}", unit.label(), command.to_shell_string());
                PreparedUnit { unit, command }
            })
            .collect();

        match options.cluster {
            Some(kind) => {
                report.state = DirectoryState::ClusterSubmit;
                report.units = self.submit_units(kind, &units, output_root, options).await;

                if options.mode.consolidates() {
                    report.state = DirectoryState::Consolidate;
                    let job_ids = report.job_ids();
                    if job_ids.is_empty() && !options.dry_run {
                        return Err(DispatchError::scheduler_output(
                            ErrorCode::SCHED_SUBMIT_FAILED,
                            "No analysis job was accepted, consolidation not submitted",
                            None,
                        ));
                    }
                    if job_ids.len() < report.units.len() && !options.dry_run {
                        warn!(
                            "Only {} of {} analysis jobs were accepted; consolidation depends on those",
                            job_ids.len(),
                            report.units.len()
                        );
                    }
                    let prerequisites = if options.dry_run {
                        report
                            .units
                            .iter()
                            .map(|u| format!("<{}>", unit_job_name(&u.label)))
                            .collect()
                    } else {
                        job_ids.iter().map(u64::to_string).collect()
                    };
                    let outcome = self
                        .submit_consolidation(kind, output_root, prerequisites, options)
                        .await;
                    if !outcome.is_success() {
                        return outcome.result.map(|_| ());
                    }
                    report.consolidation = Some(outcome);
                }
            }
            None => {
                report.state = DirectoryState::LocalRun;
                report.units = self.run_units_locally(units, output_root, options).await;

                if options.mode.consolidates() {
                    report.state = DirectoryState::Consolidate;
                    report.consolidation = Some(self.consolidate_locally(output_root, options).await);
                } else if !options.dry_run {
                    let count = count_cropped_files(output_root);
                    info!("Cropped, no consolidation needed. Number of cropped files: {}", count);
                }
            }
        }

        Ok(())
    }

    /// Worker options for one unit; pass-through options are applied last.
    fn worker_params(
        &self,
        dir: &ExperimentDirectory,
        output_root: &Path,
        unit: &AnalysisUnit,
        options: &SweepOptions,
    ) -> WorkerParams {
        let mut params = WorkerParams::new()
            .with("indir", dir.path.as_path())
            .with("outdir", output_root)
            .with("channels", unit.channel.as_str())
            .with("loops", unit.loop_id.as_str())
            .with("well_array", unit.well_array.worker_expr())
            .with("fps", options.fps)
            .with("embryo_size", options.embryo_size)
            .with("cluster", options.cluster.map(|k| k.to_string()))
            .with("debug", options.debug);

        for (key, value) in &options.worker_args {
            params.set(key.clone(), value.clone());
        }
        params
    }

    async fn submit_units(
        &self,
        kind: SchedulerKind,
        units: &[PreparedUnit],
        output_root: &Path,
        options: &SweepOptions,
    ) -> Vec<UnitOutcome> {
        let submitter = ClusterSubmitter::new(self.subprocess.runner());
        let memory = options.mode.memory(self.config);
        let mut outcomes = Vec::with_capacity(units.len());

        for prepared in units {
            let unit = &prepared.unit;
            let array = match kind {
                SchedulerKind::Lsf => unit.well_array.lsf_expr(),
                SchedulerKind::Slurm => unit.well_array.slurm_expr(),
            };
            let request = SchedulerRequest::new(
                kind,
                unit_job_name(&unit.label()),
                memory,
                &self.config.walltime,
            )
            .with_output(&unit_log_path(output_root, unit))
            .with_array(array);

            let result = if options.dry_run {
                Ok(dry_run(request.render(&prepared.command)))
            } else {
                submitter
                    .submit(&request, &prepared.command)
                    .await
                    .map(|job| UnitStatus::Submitted { job_id: job.job_id })
            };

            if let Err(err) = &result {
                error!("Submission of {} failed: {}", unit.label(), err);
            }
            outcomes.push(UnitOutcome::new(unit.label(), result));
        }

        outcomes
    }

    async fn submit_consolidation(
        &self,
        kind: SchedulerKind,
        output_root: &Path,
        prerequisites: Vec<String>,
        options: &SweepOptions,
    ) -> UnitOutcome {
        let command = self.consolidation_command(output_root, options);
        let request = SchedulerRequest::new(
            kind,
            CONSOLIDATE_JOB_NAME,
            &self.config.mem_consolidate,
            &self.config.walltime,
        )
        .with_output(&output_root.join("consolidate.out"))
        .with_prerequisites(prerequisites);

        let result = if options.dry_run {
            Ok(dry_run(request.render(&command)))
        } else {
            ClusterSubmitter::new(self.subprocess.runner())
                .submit(&request, &command)
                .await
                .map(|job| UnitStatus::Submitted { job_id: job.job_id })
        };
        UnitOutcome::new(CONSOLIDATE_LABEL, result)
    }

    async fn run_units_locally(
        &self,
        units: Vec<PreparedUnit>,
        output_root: &Path,
        options: &SweepOptions,
    ) -> Vec<UnitOutcome> {
        if options.dry_run {
            return units
                .into_iter()
                .map(|p| UnitOutcome::new(p.unit.label(), Ok(dry_run(p.command.argv()))))
                .collect();
        }

        info!("Running the {} processes on this machine", units.len());
        let jobs = units
            .into_iter()
            .map(|p| {
                let log = unit_log_path(output_root, &p.unit);
                LocalJob::new(p.unit.label(), p.command.to_process_command(Some(&log)))
            })
            .collect();

        LocalExecutor::new(self.subprocess.runner(), self.config.max_parallel_dirs)
            .run(jobs)
            .await
            .outcomes
    }

    /// Runs strictly after every local unit has been reaped.
    async fn consolidate_locally(&self, output_root: &Path, options: &SweepOptions) -> UnitOutcome {
        let command = self.consolidation_command(output_root, options);
        if options.dry_run {
            return UnitOutcome::new(CONSOLIDATE_LABEL, Ok(dry_run(command.argv())));
        }

        debug!("Consolidate command: {}", command.to_shell_string());
        let log = output_root.join("consolidate.out");
        let process = command.to_process_command(Some(&log));

        let result = match self.subprocess.runner().run(process).await {
            Ok(output) if output.status.success() => {
                info!("Consolidation finished for {}", output_root.display());
                Ok(UnitStatus::Completed)
            }
            Ok(output) => {
                warn!("Consolidation finished with {}", output.status);
                Err(exit_failure(
                    &format!("consolidation of {}", output_root.display()),
                    &output.status,
                ))
            }
            Err(e) => {
                error!("Consolidation could not start: {}", e);
                Err(DispatchError::from(e))
            }
        };
        UnitOutcome::new(CONSOLIDATE_LABEL, result)
    }

    fn consolidation_command(&self, output_root: &Path, options: &SweepOptions) -> WorkerCommand {
        let params = WorkerParams::new()
            .with("indir", output_root)
            .with("outdir", output_root)
            .with("debug", options.debug);
        CommandBuilder::new(self.config).build(&self.config.consolidate_script, &params)
    }
}

/// Scheduler job name of a unit, `HR_<loop>_<channel>`.
fn unit_job_name(label: &str) -> String {
    format!("HR_{}", label)
}

/// `<root>/log/HR_Analysis_<loop>_<channel>.out`
pub fn unit_log_path(output_root: &Path, unit: &AnalysisUnit) -> PathBuf {
    output_root
        .join(LOG_DIR)
        .join(format!("HR_Analysis_{}.out", unit.label()))
}

fn create_output_layout(output_root: &Path) -> Result<()> {
    for sub in [LOG_DIR, RESULTS_DIR] {
        let path = output_root.join(sub);
        std::fs::create_dir_all(&path)
            .to_storage_error(&path, "Failed to create output directory")?;
    }
    Ok(())
}

fn count_cropped_files(output_root: &Path) -> usize {
    let dir = output_root.join(CROPPED_DIR_NAME);
    match std::fs::read_dir(&dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).count(),
        Err(e) => {
            warn!("Cannot list {}: {}", dir.display(), e);
            0
        }
    }
}

fn dry_run(argv: Vec<String>) -> UnitStatus {
    let command = argv.join(" ");
    info!("[dry-run] {}", command);
    UnitStatus::DryRun { command }
}
