//! Scheduler-specific rendering of submission commands.

use crate::command::WorkerCommand;
use crate::error::{DispatchError, ErrorCode};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[cfg(unix)]
const NULL_SINK: &str = "/dev/null";
#[cfg(not(unix))]
const NULL_SINK: &str = "NUL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Lsf,
    Slurm,
}

impl SchedulerKind {
    /// Submission program.
    pub fn program(&self) -> &'static str {
        match self {
            Self::Lsf => "bsub",
            Self::Slurm => "sbatch",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lsf => f.write_str("lsf"),
            Self::Slurm => f.write_str("slurm"),
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lsf" => Ok(Self::Lsf),
            "slurm" => Ok(Self::Slurm),
            other => Err(DispatchError::configuration_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("Unknown scheduler '{}', expected lsf or slurm", other),
            )),
        }
    }
}

/// Everything a scheduler needs besides the command itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerRequest {
    pub kind: SchedulerKind,
    pub walltime: String,
    pub jobname: String,
    pub memory: String,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
    /// Appended verbatim to the job name (LSF) or passed to `--array` (SLURM).
    pub array: Option<String>,
    /// Jobs that must end before this one may start. Normally job ids; a
    /// dry run renders `<jobname>` placeholders instead.
    pub prerequisites: Vec<String>,
}

impl SchedulerRequest {
    pub fn new(
        kind: SchedulerKind,
        jobname: impl Into<String>,
        memory: impl Into<String>,
        walltime: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            walltime: walltime.into(),
            jobname: jobname.into(),
            memory: memory.into(),
            stdout: None,
            stderr: None,
            array: None,
            prerequisites: Vec::new(),
        }
    }

    /// Send both streams to `path`.
    pub fn with_output(mut self, path: &Path) -> Self {
        self.stdout = Some(path.to_path_buf());
        self.stderr = Some(path.to_path_buf());
        self
    }

    pub fn with_array(mut self, array: impl Into<String>) -> Self {
        self.array = Some(array.into());
        self
    }

    pub fn with_prerequisites<I, T>(mut self, job_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.prerequisites = job_ids.into_iter().map(|id| id.to_string()).collect();
        self
    }

    /// Submission argv for this request's scheduler.
    pub fn render(&self, command: &WorkerCommand) -> Vec<String> {
        match self.kind {
            SchedulerKind::Lsf => render_lsf(self, command),
            SchedulerKind::Slurm => render_slurm(self, command),
        }
    }

    fn stdout_path(&self) -> String {
        sink(self.stdout.as_deref())
    }

    fn stderr_path(&self) -> String {
        sink(self.stderr.as_deref())
    }
}

fn sink(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| NULL_SINK.to_string())
}

/// `bsub -W <t> -J <name><array> -M<mem> -R rusage[mem=<mem>] -o .. -e .. [-w ..] "<cmd>"`
pub fn render_lsf(request: &SchedulerRequest, command: &WorkerCommand) -> Vec<String> {
    let jobname = match &request.array {
        Some(array) => format!("{}{}", request.jobname, array),
        None => request.jobname.clone(),
    };

    let mut argv = vec![
        SchedulerKind::Lsf.program().to_string(),
        "-W".to_string(),
        request.walltime.clone(),
        "-J".to_string(),
        jobname,
        format!("-M{}", request.memory),
        "-R".to_string(),
        format!("rusage[mem={}]", request.memory),
        "-o".to_string(),
        request.stdout_path(),
        "-e".to_string(),
        request.stderr_path(),
    ];

    if !request.prerequisites.is_empty() {
        let condition: Vec<String> = request
            .prerequisites
            .iter()
            .map(|id| format!("ended({})", id))
            .collect();
        argv.push("-w".to_string());
        argv.push(condition.join("&&"));
    }

    argv.push(command.to_shell_string());
    argv
}

/// `sbatch -t <t> --job-name=<name> --mem=<mem> -o .. -e .. --open-mode=truncate [--array=..] [-d afterany:..] --wrap <cmd>`
pub fn render_slurm(request: &SchedulerRequest, command: &WorkerCommand) -> Vec<String> {
    let mut argv = vec![
        SchedulerKind::Slurm.program().to_string(),
        "-t".to_string(),
        request.walltime.clone(),
        format!("--job-name={}", request.jobname),
        format!("--mem={}", request.memory),
        "-o".to_string(),
        request.stdout_path(),
        "-e".to_string(),
        request.stderr_path(),
        "--open-mode=truncate".to_string(),
    ];

    if let Some(array) = &request.array {
        argv.push(format!("--array={}", array));
    }

    if !request.prerequisites.is_empty() {
        argv.push("-d".to_string());
        argv.push(format!("afterany:{}", request.prerequisites.join(":")));
    }

    argv.push("--wrap".to_string());
    argv.push(command.to_shell_string());
    argv
}
