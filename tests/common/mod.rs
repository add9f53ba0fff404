//! Common test utilities and helpers

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scheduler variables that would turn a test process into an array element.
pub const ARRAY_VARS: &[&str] = &[
    "LSB_JOBINDEX",
    "SLURM_ARRAY_TASK_ID",
    "SLURM_ARRAY_TASK_MIN",
    "MEDAKA_DISPATCH_MAX_PARALLEL",
    "MEDAKA_DISPATCH_INTERPRETER",
    "MEDAKA_DISPATCH_WALLTIME",
];

/// Frame file name in the plate reader convention.
pub fn frame_name(well: u32, loop_id: u32, channel: u32, frame: u32) -> String {
    format!(
        "WE{well:05}---D012--PO01--LO{loop_id:03}--CO{channel}--SL{frame:03}--PX32500--PW0080--IN0010--TM280--X113563--Y038077--Z224252--T0015372985--WE{well:05}.tif"
    )
}

/// Builder for a temporary tree of experiment directories
pub struct PlateTreeBuilder {
    temp_dir: TempDir,
    plates: Vec<(String, Vec<u32>, Vec<u32>, Vec<u32>)>,
}

impl PlateTreeBuilder {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            plates: Vec::new(),
        }
    }

    /// Add a plate at `name`, relative to the input root.
    pub fn plate(mut self, name: &str, wells: &[u32], loops: &[u32], channels: &[u32]) -> Self {
        self.plates.push((
            name.to_string(),
            wells.to_vec(),
            loops.to_vec(),
            channels.to_vec(),
        ));
        self
    }

    pub fn build(self) -> PlateTree {
        let input = self.temp_dir.path().join("input");
        fs::create_dir_all(&input).expect("create input root");
        for (name, wells, loops, channels) in &self.plates {
            write_frames(&input.join(name), wells, loops, channels);
        }
        PlateTree {
            input,
            outdir: self.temp_dir.path().join("out"),
            temp_dir: self.temp_dir,
        }
    }
}

pub struct PlateTree {
    pub input: PathBuf,
    pub outdir: PathBuf,
    temp_dir: TempDir,
}

impl PlateTree {
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn input_str(&self) -> &str {
        self.input.to_str().expect("utf-8 temp path")
    }
}

fn write_frames(dir: &Path, wells: &[u32], loops: &[u32], channels: &[u32]) {
    fs::create_dir_all(dir).expect("create plate dir");
    for &well in wells {
        for &loop_id in loops {
            for &channel in channels {
                fs::write(dir.join(frame_name(well, loop_id, channel, 1)), b"")
                    .expect("write frame");
            }
        }
    }
}
