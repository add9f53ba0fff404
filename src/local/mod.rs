//! Local execution of worker processes on the current machine.

pub mod executor;

pub use executor::{exit_failure, LocalExecutor, LocalJob, LocalRunReport};
