use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;
pub mod helpers;

pub use codes::{describe_error_code, ErrorCode};
pub use helpers::{common, ErrorExt};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for the dispatcher
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No resolvable work, or an unusable configuration value. Fatal.
    #[error("[E{code:04}] Configuration error: {message}")]
    Configuration {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// A scheduler call failed or its output could not be parsed for a job id.
    #[error("[E{code:04}] Scheduler error: {message}")]
    SchedulerOutput {
        code: u16,
        message: String,
        output: Option<String>,
        #[source]
        source: Option<BoxedError>,
    },

    /// A local worker process could not be started.
    #[error("[E{code:04}] Launch error: {message}")]
    UnitLaunch {
        code: u16,
        message: String,
        command: Option<String>,
        #[source]
        source: Option<BoxedError>,
    },

    /// A worker process ran but exited unsuccessfully.
    #[error("[E{code:04}] Worker failed: {message}")]
    WorkerFailure {
        code: u16,
        message: String,
        exit_code: Option<i32>,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("[E{code:04}] Storage error: {message}")]
    Storage {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedError>,
    },
}

impl DispatchError {
    /// Create a configuration error with default code
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::configuration_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    /// Create a configuration error with specific code
    pub fn configuration_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a scheduler error, keeping the raw scheduler output for inspection
    pub fn scheduler_output(
        code: u16,
        message: impl Into<String>,
        output: Option<String>,
    ) -> Self {
        Self::SchedulerOutput {
            code,
            message: message.into(),
            output,
            source: None,
        }
    }

    pub fn unit_launch(code: u16, message: impl Into<String>, command: Option<String>) -> Self {
        Self::UnitLaunch {
            code,
            message: message.into(),
            command,
            source: None,
        }
    }

    pub fn worker_failure(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::worker_failure_with_code(ErrorCode::EXEC_SUBPROCESS_FAILED, message, exit_code)
    }

    pub fn worker_failure_with_code(
        code: u16,
        message: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::WorkerFailure {
            code,
            message: message.into(),
            exit_code,
            source: None,
        }
    }

    /// Create a storage error with default code
    pub fn storage(message: impl Into<String>) -> Self {
        Self::storage_with_code(ErrorCode::STORAGE_GENERIC, message, None)
    }

    /// Create a storage error with specific code and path
    pub fn storage_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a generic other error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Configuration { source: src, .. }
            | Self::SchedulerOutput { source: src, .. }
            | Self::UnitLaunch { source: src, .. }
            | Self::WorkerFailure { source: src, .. }
            | Self::Storage { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Configuration { message, .. }
            | Self::SchedulerOutput { message, .. }
            | Self::UnitLaunch { message, .. }
            | Self::WorkerFailure { message, .. }
            | Self::Storage { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => 2,
            Self::Storage { .. } => 4,
            Self::UnitLaunch { .. } | Self::WorkerFailure { .. } => 5,
            Self::SchedulerOutput { .. } => 6,
            Self::Other { .. } => 1,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Configuration { code, .. }
            | Self::SchedulerOutput { code, .. }
            | Self::UnitLaunch { code, .. }
            | Self::WorkerFailure { code, .. }
            | Self::Storage { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_scheduler(&self) -> bool {
        matches!(self, Self::SchedulerOutput { .. })
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { message, .. } => format!("Configuration problem: {}", message),
            Self::SchedulerOutput { message, .. } => format!("Cluster submission failed: {}", message),
            Self::UnitLaunch {
                message, command, ..
            } => match command {
                Some(cmd) => format!("Could not start '{}': {}", cmd, message),
                None => format!("Could not start worker: {}", message),
            },
            Self::WorkerFailure {
                message, exit_code, ..
            } => match exit_code {
                Some(code) => format!("Worker exited with status {}: {}", code, message),
                None => format!("Worker failed: {}", message),
            },
            Self::Storage { message, path, .. } => match path {
                Some(p) => format!("Storage error at {}: {}", p.display(), message),
                None => format!("Storage error: {}", message),
            },
            Self::Other { message, .. } => message.clone(),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        use std::error::Error as _;

        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            out.push_str(&format!("\n  caused by: {}", err));
            source = err.source();
        }
        out
    }
}

/// Type alias for Results using DispatchError
pub type Result<T> = std::result::Result<T, DispatchError>;

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let (code, message) = match err.kind() {
            ErrorKind::NotFound => (ErrorCode::STORAGE_NOT_FOUND, "File or directory not found"),
            ErrorKind::PermissionDenied => {
                (ErrorCode::STORAGE_PERMISSION_DENIED, "Permission denied")
            }
            _ => (ErrorCode::STORAGE_IO_ERROR, "IO operation failed"),
        };

        DispatchError::storage_with_code(code, message, None).with_source(err)
    }
}

impl From<toml::de::Error> for DispatchError {
    fn from(err: toml::de::Error) -> Self {
        DispatchError::configuration_with_code(
            ErrorCode::CONFIG_INVALID_TOML,
            "Invalid TOML syntax",
        )
        .with_source(err)
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::other("JSON serialization failed").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_other() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DispatchError::from(json_err);
        assert_eq!(err.code(), ErrorCode::OTHER_GENERIC);
        assert_eq!(err.exit_code(), 1);
        assert!(err.developer_message().contains("caused by"));
    }

    #[test]
    fn test_error_creation_and_chaining() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "frames");
        let err = DispatchError::storage("Cannot list directory")
            .with_source(io_err)
            .with_context("while describing experiment");

        assert_eq!(err.code(), ErrorCode::STORAGE_GENERIC);
        assert!(err.to_string().contains("[E3000]"));
        assert!(err.user_message().contains("Cannot list directory"));
        assert!(err.developer_message().contains("caused by: frames"));
    }

    #[test]
    fn test_exit_codes() {
        let err = DispatchError::configuration_with_code(
            ErrorCode::CONFIG_NO_DIRECTORIES,
            "no directories",
        );
        assert!(err.is_configuration());
        assert_eq!(err.exit_code(), 2);

        let err = DispatchError::scheduler_output(ErrorCode::SCHED_NO_JOB_ID, "no id", None);
        assert!(err.is_scheduler());
        assert_eq!(err.exit_code(), 6);

        assert_eq!(DispatchError::worker_failure("boom", Some(3)).exit_code(), 5);
    }

    #[test]
    fn test_io_conversion() {
        let err: DispatchError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(err.code(), ErrorCode::STORAGE_PERMISSION_DENIED);
    }
}
