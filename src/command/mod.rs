//! Worker command construction.
//!
//! Options become `--key value` pairs, booleans become bare flags and falsy
//! values are dropped. The result is an argument vector; it is only joined
//! into a string when a scheduler needs the command as a single token.

pub mod builder;
pub mod params;

pub use builder::{CommandBuilder, WorkerCommand};
pub use params::{ParamValue, WorkerParams};
