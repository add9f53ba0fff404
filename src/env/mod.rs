//! Environment abstraction for scheduler-provided state
//!
//! Array workers learn which slice of work they own from environment variables
//! set by LSF or SLURM. Reading them through a trait instead of `std::env`
//! lets the index logic be exercised without mutating the real process
//! environment.
//!
//! # Usage
//!
//! ```
//! use medaka_dispatch::env::{EnvironmentView, MockEnv};
//!
//! let env = MockEnv::new().with_var("SLURM_ARRAY_TASK_ID", "5");
//! assert_eq!(env.var("SLURM_ARRAY_TASK_ID").as_deref(), Some("5"));
//! assert!(env.var("LSB_JOBINDEX").is_none());
//! ```

mod mock;
mod real;
mod traits;

pub use mock::MockEnv;
pub use real::ProcessEnvironment;
pub use traits::EnvironmentView;
