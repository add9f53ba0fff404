//! CLI command handlers
//!
//! Argument parsing structures, routing and the subcommand implementations.

pub mod args;
pub mod commands;
pub mod router;

pub use args::{Cli, Commands};
pub use router::execute_command;
