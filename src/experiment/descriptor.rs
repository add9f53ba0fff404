//! Inventory of one experiment directory.
//!
//! Frame files follow the plate reader's naming convention, e.g.
//! `WE00001---D012--PO01--LO001--CO6--SL001--PX32500--...--WE00001.tif`,
//! from which the well, loop and channel of every frame are read.

use crate::error::{DispatchError, ErrorCode, ErrorExt, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, trace};

static FRAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^WE(?P<well>\d+)-{3}.*?--LO(?P<loop>\d+)--CO(?P<channel>\d+)--")
        .expect("Valid regex pattern")
});

/// Well, loop and channel encoded in one frame file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameKey {
    pub well: String,
    pub loop_id: String,
    pub channel: String,
}

impl FrameKey {
    /// Parse a frame file name; `None` for anything that is not a frame.
    pub fn parse(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        if !(lower.ends_with(".tif") || lower.ends_with(".tiff")) {
            return None;
        }
        let caps = FRAME_RE.captures(file_name)?;
        Some(Self {
            well: format!("WE{}", &caps["well"]),
            loop_id: format!("LO{}", &caps["loop"]),
            channel: format!("CO{}", &caps["channel"]),
        })
    }
}

/// Numeric part of a well id (`WE00012` -> 12).
pub fn well_number(well: &str) -> Option<u32> {
    well.strip_prefix("WE").and_then(|n| n.parse().ok())
}

/// Canonical well id for a well number (12 -> `WE00012`).
pub fn well_id(number: u32) -> String {
    format!("WE{:05}", number)
}

/// Channels, loops and wells available in one experiment directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperimentDescriptor {
    pub channels: BTreeSet<String>,
    pub loops: BTreeSet<String>,
    pub wells: BTreeSet<String>,
    /// Distinct (well, loop, channel) recordings.
    pub video_count: usize,
}

impl ExperimentDescriptor {
    pub fn from_keys<I: IntoIterator<Item = FrameKey>>(keys: I) -> Self {
        let mut descriptor = Self::default();
        let mut videos = BTreeSet::new();
        for key in keys {
            descriptor.channels.insert(key.channel.clone());
            descriptor.loops.insert(key.loop_id.clone());
            descriptor.wells.insert(key.well.clone());
            videos.insert(key);
        }
        descriptor.video_count = videos.len();
        descriptor
    }

    /// Read the frame files directly inside `dir`.
    pub fn scan(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .to_storage_error(dir, "Failed to list experiment directory")?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.to_storage_error(dir, "Failed to read directory entry")?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match FrameKey::parse(name) {
                Some(key) => keys.push(key),
                None => trace!("Skipping non-frame file {}", name),
            }
        }

        if keys.is_empty() {
            return Err(DispatchError::storage_with_code(
                ErrorCode::STORAGE_NOT_FOUND,
                "No frame files found",
                Some(dir.to_path_buf()),
            ));
        }

        let descriptor = Self::from_keys(keys);
        debug!(
            "{}: {} videos, {} channels, {} loops, {} wells",
            dir.display(),
            descriptor.video_count,
            descriptor.channels.len(),
            descriptor.loops.len(),
            descriptor.wells.len()
        );
        Ok(descriptor)
    }

    /// Sorted numeric well ids.
    pub fn well_numbers(&self) -> BTreeSet<u32> {
        self.wells.iter().filter_map(|w| well_number(w)).collect()
    }
}

/// Whether `dir` directly holds at least one frame file.
pub fn contains_frames(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .any(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(FrameKey::parse)
                .is_some()
        })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    /// Frame file name in the plate reader convention.
    pub fn frame_name(well: u32, loop_id: u32, channel: u32, frame: u32) -> String {
        format!(
            "WE{well:05}---D012--PO01--LO{loop_id:03}--CO{channel}--SL{frame:03}--PX32500--PW0080--IN0010--TM280--X113563--Y038077--Z224252--T0015372985--WE{well:05}.tif"
        )
    }

    /// Write empty frames for every well x loop x channel combination.
    pub fn write_frames(dir: &Path, wells: &[u32], loops: &[u32], channels: &[u32]) {
        std::fs::create_dir_all(dir).unwrap();
        for &well in wells {
            for &loop_id in loops {
                for &channel in channels {
                    for frame in 1..=2 {
                        let name = frame_name(well, loop_id, channel, frame);
                        std::fs::write(dir.join(name), b"").unwrap();
                    }
                }
            }
        }
    }
}
