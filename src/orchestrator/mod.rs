//! Top-level sweep control flow.
//!
//! Each experiment directory moves through
//! `Discover -> Plan -> Dispatch -> (LocalRun | ClusterSubmit) -> Consolidate -> Done`,
//! or ends in `Failed`. Directories are processed one after another.

pub mod options;
pub mod report;
pub mod sweep;

pub use options::{AnalysisMode, SweepOptions};
pub use report::{DirectoryReport, DirectoryState, RunReport, UnitOutcome, UnitStatus};
pub use sweep::{unit_log_path, Orchestrator};
