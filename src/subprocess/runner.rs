use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use super::error::ProcessError;

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    /// When set, stdout and stderr are written together to this file
    /// instead of being captured.
    pub log_file: Option<PathBuf>,
}

impl ProcessCommand {
    /// Program and arguments joined for logs.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        shell_words::join(parts)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// stdout followed by stderr, the way a terminal would show them.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout.trim_end(), self.stderr)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            _ => None,
        }
    }

    /// Convert process exit status to our ExitStatus enum
    pub fn from_std(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::from_signal(status)
        }
    }

    #[cfg(unix)]
    fn from_signal(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;
        match status.signal() {
            Some(signal) => ExitStatus::Signal(signal),
            None => ExitStatus::Error(1),
        }
    }

    #[cfg(not(unix))]
    fn from_signal(_status: std::process::ExitStatus) -> Self {
        ExitStatus::Error(1)
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitStatus::Success => write!(f, "success"),
            ExitStatus::Error(code) => write!(f, "exit code {}", code),
            ExitStatus::Signal(sig) => write!(f, "signal {}", sig),
        }
    }
}

/// A started process. Resolves to its exit status.
pub struct ProcessHandle {
    exit: BoxFuture<'static, Result<ExitStatus, ProcessError>>,
}

impl ProcessHandle {
    pub fn new(exit: BoxFuture<'static, Result<ExitStatus, ProcessError>>) -> Self {
        Self { exit }
    }

    /// Handle for a process that has already exited.
    pub fn finished(status: ExitStatus) -> Self {
        Self::new(futures::future::ready(Ok(status)).boxed())
    }

    pub async fn wait(self) -> Result<ExitStatus, ProcessError> {
        self.exit.await
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion and capture output.
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;

    /// Start the process and return without waiting for it.
    fn spawn(&self, command: &ProcessCommand) -> Result<ProcessHandle, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn log_command_start(command: &ProcessCommand) {
        tracing::debug!("Executing subprocess: {}", command.display());
        if let Some(ref log) = command.log_file {
            tracing::trace!("Output goes to {}", log.display());
        }
    }

    /// Configure the command and its stdio
    fn configure_command(
        command: &ProcessCommand,
    ) -> Result<tokio::process::Command, ProcessError> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);

        cmd.stdin(Stdio::null());
        match &command.log_file {
            Some(path) => {
                let file = File::create(path).map_err(|e| ProcessError::LogFile {
                    path: path.clone(),
                    source: e,
                })?;
                let err_file = file.try_clone().map_err(|e| ProcessError::LogFile {
                    path: path.clone(),
                    source: e,
                })?;
                cmd.stdout(Stdio::from(file));
                cmd.stderr(Stdio::from(err_file));
            }
            None => {
                cmd.stdout(Stdio::piped());
                cmd.stderr(Stdio::piped());
            }
        }

        Ok(cmd)
    }

    /// Map spawn error to ProcessError
    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        if error.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: command.display(),
                source: error,
            }
        }
    }

    fn spawn_child(command: &ProcessCommand) -> Result<tokio::process::Child, ProcessError> {
        Self::log_command_start(command);
        let mut cmd = Self::configure_command(command)?;
        cmd.spawn().map_err(|e| {
            tracing::error!("Failed to spawn '{}': {} ({:?})", command.program, e, e.kind());
            Self::map_spawn_error(e, command)
        })
    }

    /// Log the process execution result
    fn log_result(result: &ProcessOutput, command: &ProcessCommand) {
        match &result.status {
            ExitStatus::Success => {
                tracing::debug!(
                    "Subprocess completed successfully in {:?}: {}",
                    result.duration,
                    command.program
                );
            }
            status => {
                tracing::debug!(
                    "Subprocess finished with {} in {:?}: {}",
                    status,
                    result.duration,
                    command.program
                );
                if !result.stderr.is_empty() {
                    tracing::trace!("Stderr: {}", result.stderr);
                }
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = std::time::Instant::now();

        let child = Self::spawn_child(&command)?;
        let output = child.wait_with_output().await.map_err(ProcessError::Io)?;

        let result = ProcessOutput {
            status: ExitStatus::from_std(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        Self::log_result(&result, &command);
        Ok(result)
    }

    fn spawn(&self, command: &ProcessCommand) -> Result<ProcessHandle, ProcessError> {
        let mut child = Self::spawn_child(command)?;
        Ok(ProcessHandle::new(
            async move {
                let status = child.wait().await.map_err(ProcessError::Io)?;
                Ok(ExitStatus::from_std(status))
            }
            .boxed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::ProcessCommandBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_display_quotes_arguments() {
        let command = ProcessCommandBuilder::new("python3")
            .args(["medaka_bpm.py", "--indir", "/data/my exp"])
            .build();
        assert_eq!(command.display(), "python3 medaka_bpm.py --indir '/data/my exp'");
    }

    #[test]
    fn test_combined_output() {
        let output = ProcessOutput {
            status: ExitStatus::Success,
            stdout: "out\n".to_string(),
            stderr: "err".to_string(),
            duration: Duration::from_millis(1),
        };
        assert_eq!(output.combined(), "out\nerr");
    }

    #[test]
    fn test_convert_exit_status() {
        use std::os::unix::process::ExitStatusExt;

        let status = std::process::ExitStatus::from_raw(0);
        assert_eq!(ExitStatus::from_std(status), ExitStatus::Success);

        let status = std::process::ExitStatus::from_raw(256);
        assert_eq!(ExitStatus::from_std(status), ExitStatus::Error(1));

        let status = std::process::ExitStatus::from_raw(9);
        assert_eq!(ExitStatus::from_std(status), ExitStatus::Signal(9));
    }

    #[tokio::test]
    async fn test_log_file_receives_both_streams() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("unit.out");
        let command = ProcessCommandBuilder::new("sh")
            .args(["-c", "echo to-stdout; echo to-stderr 1>&2"])
            .log_file(&log)
            .build();

        let handle = TokioProcessRunner.spawn(&command).unwrap();
        assert!(handle.wait().await.unwrap().success());

        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.contains("to-stdout"));
        assert!(content.contains("to-stderr"));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let command = ProcessCommandBuilder::new("nonexistent_command_12345").build();
        let result = TokioProcessRunner.spawn(&command).map(|_| ());
        assert!(matches!(result, Err(ProcessError::CommandNotFound(_))));
    }

    #[tokio::test]
    async fn test_spawned_exit_status() {
        let command = ProcessCommandBuilder::new("sh").args(["-c", "exit 4"]).build();
        let handle = TokioProcessRunner.spawn(&command).unwrap();
        assert_eq!(handle.wait().await.unwrap(), ExitStatus::Error(4));
    }
}
