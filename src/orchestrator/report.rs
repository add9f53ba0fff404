//! Per-unit and per-directory outcomes collected during a run.

use crate::error::DispatchError;
use std::path::PathBuf;

/// What happened to one unit that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Local worker exited successfully.
    Completed,
    /// Accepted by the scheduler under this job id.
    Submitted { job_id: u64 },
    /// Rendered only.
    DryRun { command: String },
}

#[derive(Debug)]
pub struct UnitOutcome {
    pub label: String,
    pub result: Result<UnitStatus, DispatchError>,
}

impl UnitOutcome {
    pub fn new(label: impl Into<String>, result: Result<UnitStatus, DispatchError>) -> Self {
        Self {
            label: label.into(),
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn job_id(&self) -> Option<u64> {
        match self.result {
            Ok(UnitStatus::Submitted { job_id }) => Some(job_id),
            _ => None,
        }
    }
}

/// Lifecycle of one experiment directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryState {
    Discover,
    Plan,
    Dispatch,
    LocalRun,
    ClusterSubmit,
    Consolidate,
    Done,
    Failed,
}

impl std::fmt::Display for DirectoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Discover => "discover",
            Self::Plan => "plan",
            Self::Dispatch => "dispatch",
            Self::LocalRun => "local-run",
            Self::ClusterSubmit => "cluster-submit",
            Self::Consolidate => "consolidate",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct DirectoryReport {
    pub directory: PathBuf,
    pub output_root: PathBuf,
    pub state: DirectoryState,
    pub units: Vec<UnitOutcome>,
    /// `None` when consolidation was not attempted (crop mode, or failure
    /// before it).
    pub consolidation: Option<UnitOutcome>,
    /// Error that stopped this directory before `Done`.
    pub error: Option<DispatchError>,
}

impl DirectoryReport {
    pub fn new(directory: PathBuf, output_root: PathBuf) -> Self {
        Self {
            directory,
            output_root,
            state: DirectoryState::Discover,
            units: Vec::new(),
            consolidation: None,
            error: None,
        }
    }

    pub fn failed_units(&self) -> usize {
        self.units.iter().filter(|u| !u.is_success()).count()
    }

    pub fn job_ids(&self) -> Vec<u64> {
        self.units.iter().filter_map(UnitOutcome::job_id).collect()
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub directories: Vec<DirectoryReport>,
}

impl RunReport {
    pub fn total_units(&self) -> usize {
        self.directories.iter().map(|d| d.units.len()).sum()
    }

    pub fn failed_units(&self) -> usize {
        self.directories.iter().map(DirectoryReport::failed_units).sum()
    }

    pub fn failed_directories(&self) -> usize {
        self.directories
            .iter()
            .filter(|d| d.state == DirectoryState::Failed)
            .count()
    }
}
