use super::dispatch_config::{executable_dir, DispatchConfig, DEFAULT_CONFIG_FILE};
use crate::env::EnvironmentView;
use crate::error::{common, ErrorExt, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads a [`DispatchConfig`] from its layered sources.
pub struct ConfigLoader<'a, E: EnvironmentView + ?Sized> {
    env: &'a E,
    explicit_path: Option<PathBuf>,
    search_dir: Option<PathBuf>,
}

impl<'a, E: EnvironmentView + ?Sized> ConfigLoader<'a, E> {
    pub fn new(env: &'a E) -> Self {
        Self {
            env,
            explicit_path: None,
            search_dir: None,
        }
    }

    /// Use this file; it must exist.
    pub fn with_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// Look for `dispatch.toml` here instead of next to the executable.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    pub fn load(self) -> Result<DispatchConfig> {
        let mut config = match self.config_file()? {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(&path)
                    .to_storage_error(&path, "Failed to read configuration file")?;
                DispatchConfig::from_toml_str(&content)
                    .map_err(|e| e.with_context(path.display()))?
            }
            None => {
                debug!("No configuration file found, using defaults");
                DispatchConfig::default()
            }
        };

        config.merge_env_vars(self.env)?;
        Ok(config)
    }

    fn config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.explicit_path {
            if !path.is_file() {
                return Err(common::config_not_found(path));
            }
            return Ok(Some(path.clone()));
        }

        let dir = self.search_dir.clone().unwrap_or_else(executable_dir);
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        Ok(candidate.is_file().then_some(candidate))
    }
}

/// Load configuration with the process environment and default search location.
pub fn load_config<E: EnvironmentView + ?Sized>(
    env: &E,
    explicit: Option<&Path>,
) -> Result<DispatchConfig> {
    ConfigLoader::new(env)
        .with_file(explicit.map(Path::to_path_buf))
        .load()
}
