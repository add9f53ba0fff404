use crate::cluster::SchedulerKind;
use crate::command::ParamValue;
use crate::config::DispatchConfig;
use crate::plan::Filters;
use std::path::{Path, PathBuf};

/// Which worker program the sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Heart-rate analysis, consolidated afterwards.
    #[default]
    Bpm,
    /// Cropping only; nothing to consolidate.
    Crop,
}

impl AnalysisMode {
    pub fn script<'a>(&self, config: &'a DispatchConfig) -> &'a Path {
        match self {
            Self::Bpm => &config.bpm_script,
            Self::Crop => &config.crop_script,
        }
    }

    pub fn memory<'a>(&self, config: &'a DispatchConfig) -> &'a str {
        match self {
            Self::Bpm => &config.mem_bpm,
            Self::Crop => &config.mem_crop,
        }
    }

    pub fn consolidates(&self) -> bool {
        matches!(self, Self::Bpm)
    }
}

/// Everything one invocation asks for.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Directory, glob pattern or list file.
    pub indir: String,
    pub outdir: PathBuf,
    pub filters: Filters,
    /// Frames per second; `0` lets the worker derive it.
    pub fps: f64,
    pub embryo_size: u32,
    pub cluster: Option<SchedulerKind>,
    pub mode: AnalysisMode,
    pub debug: bool,
    pub dry_run: bool,
    /// Extra worker options, applied after the built-in ones.
    pub worker_args: Vec<(String, ParamValue)>,
}

impl SweepOptions {
    pub fn new(indir: impl Into<String>, outdir: impl Into<PathBuf>) -> Self {
        Self {
            indir: indir.into(),
            outdir: outdir.into(),
            filters: Filters::default(),
            fps: 0.0,
            embryo_size: 300,
            cluster: None,
            mode: AnalysisMode::Bpm,
            debug: false,
            dry_run: false,
            worker_args: Vec::new(),
        }
    }
}
