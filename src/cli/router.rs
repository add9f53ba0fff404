//! Command routing and execution

use crate::cli::args::Commands;
use crate::cli::commands::{plan, resolve_index, run};
use anyhow::Result;
use std::path::PathBuf;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Commands, config: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Run {
            sweep,
            cluster,
            max_parallel,
            debug,
            dry_run,
            worker_args,
        } => {
            let run_cmd = run::RunCommand {
                sweep,
                cluster,
                max_parallel,
                debug,
                dry_run,
                worker_args,
            };
            run::execute(run_cmd, config.as_deref()).await
        }
        Commands::Plan { sweep } => plan::execute(sweep),
        Commands::ResolveIndex(args) => resolve_index::execute(args),
    }
}
