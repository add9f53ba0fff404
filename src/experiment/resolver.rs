//! Turns the user's `--indir` argument into experiment directories.

use super::descriptor::contains_frames;
use crate::error::{common, ErrorExt, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Sub-directory written by the cropping step; analysed as its own experiment.
pub const CROPPED_DIR_NAME: &str = "croppedRAWTiff";

/// One experiment directory and its derived identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ExperimentDirectory {
    pub path: PathBuf,
    /// Name used for log files; distinct for a cropped variant.
    pub experiment_id: String,
    /// Name of the output sub-directory; a cropped variant shares its parent's.
    pub output_name: String,
}

impl ExperimentDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = normalize(&path.into());
        let segments: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let last = segments.last().cloned().unwrap_or_else(|| ".".to_string());
        let (experiment_id, output_name) = if last == CROPPED_DIR_NAME && segments.len() >= 2 {
            let parent = segments[segments.len() - 2].clone();
            (format!("{}_{}", parent, last), parent)
        } else {
            (last.clone(), last)
        };

        Self {
            path,
            experiment_id,
            output_name,
        }
    }

    pub fn is_cropped_variant(&self) -> bool {
        self.path.file_name().and_then(|n| n.to_str()) == Some(CROPPED_DIR_NAME)
    }

    /// Output root of this experiment under the run's base output directory.
    pub fn output_root(&self, base: &Path) -> PathBuf {
        base.join(&self.output_name)
    }
}

/// Resolves a directory, glob pattern or list file into experiment directories.
#[derive(Debug, Default)]
pub struct DirectoryResolver;

impl DirectoryResolver {
    pub fn new() -> Self {
        Self
    }

    /// Ordered, de-duplicated experiment directories for `input`.
    ///
    /// Paths are ordered as plain strings (`plate-A` before
    /// `plate/croppedRAWTiff`). That order is what array elements index
    /// into, so it must not depend on file system iteration order.
    pub fn resolve(&self, input: &str) -> Result<Vec<ExperimentDirectory>> {
        let roots = self.candidate_roots(input)?;
        debug!("Input '{}' expanded to {} candidate path(s)", input, roots.len());

        let mut found = BTreeSet::new();
        for root in roots {
            if !root.is_dir() {
                warn!("Skipping {}: not a directory", root.display());
                continue;
            }
            found.extend(detect_experiment_directories(&root));
        }

        if found.is_empty() {
            return Err(common::no_directories(input));
        }

        let mut paths: Vec<PathBuf> = found.into_iter().collect();
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        let dirs: Vec<_> = paths.into_iter().map(ExperimentDirectory::new).collect();
        info!("Resolved {} experiment director(ies)", dirs.len());
        for dir in &dirs {
            if dir.is_cropped_variant() {
                debug!("  {} (cropped)", dir.path.display());
            } else {
                debug!("  {}", dir.path.display());
            }
        }
        Ok(dirs)
    }

    fn candidate_roots(&self, input: &str) -> Result<Vec<PathBuf>> {
        let path = Path::new(input);

        if path.is_dir() {
            return Ok(vec![path.to_path_buf()]);
        }

        if path.is_file() {
            let content = std::fs::read_to_string(path)
                .to_storage_error(path, "Failed to read directory list")?;
            return Ok(parse_list_file(&content));
        }

        if is_glob(input) {
            let entries = glob::glob(input)
                .to_configuration_error(format!("Invalid glob pattern '{}'", input))?;
            let mut paths = Vec::new();
            for entry in entries {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => warn!("Glob error: {}", e),
                }
            }
            return Ok(paths);
        }

        Ok(Vec::new())
    }
}

/// Non-empty lines of a directory list file.
pub fn parse_list_file(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Every directory under `root` (inclusive) that directly contains frames.
pub fn detect_experiment_directories(root: &Path) -> BTreeSet<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| contains_frames(entry.path()))
        .map(|entry| normalize(entry.path()))
        .collect()
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
