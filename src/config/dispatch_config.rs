//! Dispatcher configuration.
//!
//! Built once at process start and handed to each component by reference.
//! Sources are layered with increasing precedence:
//!
//! 1. Hardcoded defaults
//! 2. A TOML file (`--config`, or `dispatch.toml` next to the executable)
//! 3. Environment variables (`MEDAKA_DISPATCH_*`)
//! 4. Command-line overrides applied by the caller

use crate::env::EnvironmentView;
use crate::error::{common, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_MAX_PARALLEL: &str = "MEDAKA_DISPATCH_MAX_PARALLEL";
pub const ENV_INTERPRETER: &str = "MEDAKA_DISPATCH_INTERPRETER";
pub const ENV_WALLTIME: &str = "MEDAKA_DISPATCH_WALLTIME";

/// Name of the config file looked up in the install directory.
pub const DEFAULT_CONFIG_FILE: &str = "dispatch.toml";

static WALLTIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+:[0-5]\d(:[0-5]\d)?$").expect("valid walltime regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Program used to run the worker scripts.
    pub interpreter: String,

    /// Base directory for relative script paths. Defaults to the directory
    /// holding the running executable.
    pub install_dir: Option<PathBuf>,

    pub bpm_script: PathBuf,
    pub crop_script: PathBuf,
    pub consolidate_script: PathBuf,

    /// Scheduler memory requests, in the scheduler's default unit (MB).
    pub mem_bpm: String,
    pub mem_crop: String,
    pub mem_consolidate: String,

    /// Local concurrency cap.
    pub max_parallel_dirs: usize,

    /// Wall-time limit passed to the scheduler.
    pub walltime: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            install_dir: None,
            bpm_script: PathBuf::from("medaka_bpm.py"),
            crop_script: PathBuf::from("medaka_crop.py"),
            consolidate_script: PathBuf::from("src/cluster_consolidate.py"),
            mem_bpm: "8000".to_string(),
            mem_crop: "4000".to_string(),
            mem_consolidate: "3000".to_string(),
            max_parallel_dirs: 5,
            walltime: "24:00:00".to_string(),
        }
    }
}

impl DispatchConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `MEDAKA_DISPATCH_*` overrides.
    pub fn merge_env_vars<E: EnvironmentView + ?Sized>(&mut self, env: &E) -> Result<()> {
        if let Some(value) = env.var(ENV_MAX_PARALLEL) {
            self.max_parallel_dirs = value
                .trim()
                .parse()
                .map_err(|_| common::invalid_value(ENV_MAX_PARALLEL, &value))?;
            debug!("max_parallel_dirs overridden from environment: {}", value);
        }

        if let Some(value) = env.var(ENV_INTERPRETER) {
            self.interpreter = value;
        }

        if let Some(value) = env.var(ENV_WALLTIME) {
            self.walltime = value;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_dirs == 0 {
            return Err(common::invalid_value("max_parallel_dirs", 0));
        }
        if self.interpreter.trim().is_empty() {
            return Err(common::invalid_value("interpreter", "<empty>"));
        }
        if !WALLTIME_RE.is_match(&self.walltime) {
            return Err(common::invalid_value("walltime", &self.walltime));
        }
        for (field, value) in [
            ("mem_bpm", &self.mem_bpm),
            ("mem_crop", &self.mem_crop),
            ("mem_consolidate", &self.mem_consolidate),
        ] {
            match value.parse::<u64>() {
                Ok(n) if n > 0 => {}
                _ => return Err(common::invalid_value(field, value)),
            }
        }
        Ok(())
    }

    /// Directory that relative script paths are resolved against.
    pub fn effective_install_dir(&self) -> PathBuf {
        self.install_dir.clone().unwrap_or_else(executable_dir)
    }

    /// Absolute path of `script`, independent of the current directory.
    pub fn resolve_script(&self, script: &Path) -> PathBuf {
        if script.is_absolute() {
            script.to_path_buf()
        } else {
            self.effective_install_dir().join(script)
        }
    }
}

/// Directory of the running executable, falling back to the current directory.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
