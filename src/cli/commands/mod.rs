//! Subcommand implementations

pub mod plan;
pub mod resolve_index;
pub mod run;

use crate::cli::args::SweepArgs;
use crate::error::Result;
use crate::orchestrator::{AnalysisMode, SweepOptions};
use crate::plan::Filters;

/// Filters requested on the command line.
pub fn filters_from_args(sweep: &SweepArgs) -> Result<Filters> {
    Filters::new()
        .with_channels(&sweep.channels)
        .with_loops(&sweep.loops)
        .with_well_expr(sweep.wells.as_deref())
}

/// Sweep options shared by every subcommand that plans work.
pub fn sweep_options_from_args(sweep: &SweepArgs) -> Result<SweepOptions> {
    let mut options = SweepOptions::new(sweep.indir.clone(), sweep.outdir.clone());
    options.filters = filters_from_args(sweep)?;
    options.fps = sweep.fps;
    options.embryo_size = sweep.embryo_size;
    options.mode = if sweep.crop {
        AnalysisMode::Crop
    } else {
        AnalysisMode::Bpm
    };
    Ok(options)
}
