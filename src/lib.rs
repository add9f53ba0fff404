//! # medaka-dispatch
//!
//! Dispatches medaka heart-rate analysis sweeps. Every (channel, loop)
//! combination found in an experiment directory becomes one worker
//! invocation over an array of wells, run either on this machine under a
//! concurrency cap or as LSF/SLURM array jobs, followed by a consolidation
//! step gated on all of them.
//!
//! ## Usage
//!
//! ```bash
//! medaka-dispatch run -i /data/plate -o ./outdir -c CO6 --cluster slurm
//! medaka-dispatch plan -i /data/plates
//! medaka-dispatch resolve-index --wells "[1-96]"
//! ```
//!
//! ## Modules
//!
//! - `experiment` - Experiment directory discovery and frame inventory
//! - `plan` - Filters, well arrays and the (channel, loop) cross product
//! - `command` - Worker command construction
//! - `local` - Concurrency-capped local execution
//! - `cluster` - LSF/SLURM rendering, submission and job-id parsing
//! - `array_index` - Array element self-identification
//! - `orchestrator` - Per-directory plan, dispatch and consolidate
//! - `subprocess` - Process runner abstraction with a mock for tests
//! - `env` - Injectable environment variable access
//! - `config` - Layered dispatcher configuration
pub mod app;
pub mod array_index;
pub mod cli;
pub mod cluster;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod experiment;
pub mod local;
pub mod orchestrator;
pub mod plan;
pub mod subprocess;

pub use error::{DispatchError, Result};
