//! Batch scheduler submission (LSF and SLURM).

pub mod request;
pub mod submitter;

pub use request::{render_lsf, render_slurm, SchedulerKind, SchedulerRequest};
pub use submitter::{parse_job_id, ClusterJob, ClusterSubmitter};
