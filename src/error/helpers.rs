use super::{DispatchError, ErrorCode};
use std::path::Path;

/// Extension trait for convenient error conversion
pub trait ErrorExt<T> {
    fn to_configuration_error(self, message: impl Into<String>) -> Result<T, DispatchError>;
    fn to_storage_error(self, path: &Path, message: impl Into<String>) -> Result<T, DispatchError>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn to_configuration_error(self, message: impl Into<String>) -> Result<T, DispatchError> {
        self.map_err(|e| DispatchError::configuration(message).with_source(e))
    }

    fn to_storage_error(self, path: &Path, message: impl Into<String>) -> Result<T, DispatchError> {
        self.map_err(|e| {
            DispatchError::storage_with_code(
                ErrorCode::STORAGE_IO_ERROR,
                message,
                Some(path.to_path_buf()),
            )
            .with_source(e)
        })
    }
}

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    pub fn config_not_found(path: impl AsRef<Path>) -> DispatchError {
        DispatchError::configuration_with_code(
            ErrorCode::CONFIG_NOT_FOUND,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
    }

    pub fn no_directories(input: &str) -> DispatchError {
        DispatchError::configuration_with_code(
            ErrorCode::CONFIG_NO_DIRECTORIES,
            format!("No experiment directories could be resolved from '{}'", input),
        )
    }

    pub fn no_combinations(directory: impl AsRef<Path>) -> DispatchError {
        DispatchError::configuration_with_code(
            ErrorCode::CONFIG_NO_COMBINATIONS,
            format!(
                "No loops or channels were found in {}",
                directory.as_ref().display()
            ),
        )
    }

    pub fn invalid_value(field: &str, value: impl std::fmt::Display) -> DispatchError {
        DispatchError::configuration_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("Invalid value for {}: {}", field, value),
        )
    }
}
