//! `run`: plan and dispatch the sweep

use super::sweep_options_from_args;
use crate::cli::args::SweepArgs;
use crate::cluster::SchedulerKind;
use crate::command::ParamValue;
use crate::config::load_config;
use crate::env::ProcessEnvironment;
use crate::orchestrator::{Orchestrator, RunReport, UnitStatus};
use crate::subprocess::SubprocessManager;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub struct RunCommand {
    pub sweep: SweepArgs,
    pub cluster: Option<SchedulerKind>,
    pub max_parallel: Option<usize>,
    pub debug: bool,
    pub dry_run: bool,
    pub worker_args: Vec<(String, String)>,
}

pub async fn execute(command: RunCommand, config_path: Option<&Path>) -> Result<()> {
    let env = ProcessEnvironment::new();
    let mut config = load_config(&env, config_path)?;
    if let Some(max_parallel) = command.max_parallel {
        config.max_parallel_dirs = max_parallel;
    }
    config.validate()?;
    debug!("Effective configuration: {:?}", config);

    let mut options = sweep_options_from_args(&command.sweep)?;
    options.cluster = command.cluster;
    options.debug = command.debug;
    options.dry_run = command.dry_run;
    options.worker_args = command
        .worker_args
        .iter()
        .map(|(k, v)| (k.clone(), ParamValue::parse_cli(v)))
        .collect();

    let orchestrator = Orchestrator::new(&config, SubprocessManager::production(), &env);
    let report = orchestrator.run(&options).await?;

    if command.dry_run {
        print_dry_run(&report);
    }
    println!(
        "{} unit(s) over {} director(ies), {} failed",
        report.total_units(),
        report.directories.len(),
        report.failed_units()
    );
    Ok(())
}

fn print_dry_run(report: &RunReport) {
    for dir in &report.directories {
        let outcomes = dir.units.iter().chain(dir.consolidation.iter());
        for outcome in outcomes {
            if let Ok(UnitStatus::DryRun { command }) = &outcome.result {
                println!("{}", command);
            }
        }
    }
}
