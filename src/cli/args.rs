//! CLI argument structures

use crate::cluster::SchedulerKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dispatch medaka heart-rate analysis sweeps locally or on a cluster
#[derive(Parser, Debug)]
#[command(name = "medaka-dispatch")]
#[command(about = "medaka-dispatch - Run heart-rate analysis sweeps over channels, loops and wells", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to dispatch.toml next to the executable)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Verbosity for logging; `run --debug` implies at least `-v`.
    pub fn log_verbosity(&self) -> u8 {
        match self.command {
            Commands::Run { debug: true, .. } => self.verbose.max(1),
            _ => self.verbose,
        }
    }
}

/// What to analyse; shared by `run` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Experiment directory, glob pattern or file listing directories
    #[arg(short = 'i', long)]
    pub indir: String,

    /// Base output directory
    #[arg(short = 'o', long, default_value = "./outdir")]
    pub outdir: PathBuf,

    /// Channels to analyse, e.g. CO6,CO4
    #[arg(short = 'c', long, value_delimiter = ',')]
    pub channels: Vec<String>,

    /// Loops to analyse, e.g. LO001,LO002
    #[arg(short = 'l', long, value_delimiter = ',')]
    pub loops: Vec<String>,

    /// Well range, e.g. [1-96]
    #[arg(short = 'w', long)]
    pub wells: Option<String>,

    /// Frames per second (0 lets the worker derive it)
    #[arg(short = 'f', long, default_value = "0")]
    pub fps: f64,

    /// Embryo size in pixels
    #[arg(short = 's', long = "embryo-size", default_value = "300")]
    pub embryo_size: u32,

    /// Run the cropping step instead of the heart-rate analysis
    #[arg(long)]
    pub crop: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan and dispatch the sweep
    #[command(name = "run")]
    Run {
        #[command(flatten)]
        sweep: SweepArgs,

        /// Submit to this batch scheduler instead of running locally
        #[arg(long, value_enum)]
        cluster: Option<SchedulerKind>,

        /// Maximum number of local worker processes at a time
        #[arg(short = 'm', long)]
        max_parallel: Option<usize>,

        /// Pass --debug to the workers
        #[arg(long)]
        debug: bool,

        /// Show every command without executing or submitting it
        #[arg(long, help = "Preview commands without executing them")]
        dry_run: bool,

        /// Extra worker option, repeatable (e.g. --worker-arg average=true)
        #[arg(long = "worker-arg", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        worker_args: Vec<(String, String)>,
    },

    /// Print the planned analysis units per directory as JSON
    #[command(name = "plan")]
    Plan {
        #[command(flatten)]
        sweep: SweepArgs,
    },

    /// Print the work item owned by this array element
    #[command(name = "resolve-index")]
    ResolveIndex(ResolveIndexArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ResolveIndexArgs {
    /// Print the experiment directory owned by this element
    #[arg(long)]
    pub indir: Option<String>,

    /// Print the well owned by this element, within this range
    #[arg(long)]
    pub wells: Option<String>,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::try_parse_from([
            "medaka-dispatch",
            "-v",
            "run",
            "-i",
            "/data/plate",
            "-c",
            "CO6,CO4",
            "-l",
            "LO001",
            "--cluster",
            "slurm",
            "--worker-arg",
            "average=true",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run {
                sweep,
                cluster,
                worker_args,
                ..
            } => {
                assert_eq!(sweep.channels, vec!["CO6", "CO4"]);
                assert_eq!(sweep.loops, vec!["LO001"]);
                assert_eq!(sweep.outdir, PathBuf::from("./outdir"));
                assert_eq!(sweep.embryo_size, 300);
                assert_eq!(cluster, Some(SchedulerKind::Slurm));
                assert_eq!(worker_args, vec![("average".to_string(), "true".to_string())]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_index_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["medaka-dispatch", "resolve-index"]).is_err());
        assert!(Cli::try_parse_from([
            "medaka-dispatch",
            "resolve-index",
            "--indir",
            "/a",
            "--wells",
            "[1-2]"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["medaka-dispatch", "resolve-index", "--wells", "[1-2]"]).is_ok());
    }

    #[test]
    fn test_debug_raises_log_verbosity() {
        let cli = Cli::try_parse_from(["medaka-dispatch", "run", "-i", "/data", "--debug"]).unwrap();
        assert_eq!(cli.log_verbosity(), 1);

        let cli = Cli::try_parse_from(["medaka-dispatch", "-vv", "run", "-i", "/data", "--debug"]).unwrap();
        assert_eq!(cli.log_verbosity(), 2);

        let cli = Cli::try_parse_from(["medaka-dispatch", "plan", "-i", "/data"]).unwrap();
        assert_eq!(cli.log_verbosity(), 0);
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("threads=4").unwrap(),
            ("threads".to_string(), "4".to_string())
        );
        assert!(parse_key_val("threads").is_err());
        assert!(parse_key_val("=4").is_err());
    }
}
