use super::params::WorkerParams;
use crate::config::DispatchConfig;
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};
use serde::Serialize;
use std::path::Path;

/// Fully resolved worker invocation. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Single string for schedulers that take the command as one token.
    pub fn to_shell_string(&self) -> String {
        shell_words::join(self.argv())
    }

    pub fn to_process_command(&self, log_file: Option<&Path>) -> ProcessCommand {
        let builder = ProcessCommandBuilder::new(&self.program).args(&self.args);
        match log_file {
            Some(path) => builder.log_file(path).build(),
            None => builder.build(),
        }
    }
}

/// Builds worker invocations as `<interpreter> <absolute script> <flags>`.
pub struct CommandBuilder<'a> {
    config: &'a DispatchConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a DispatchConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, script: &Path, params: &WorkerParams) -> WorkerCommand {
        let script = self.config.resolve_script(script);
        let mut args = Vec::with_capacity(params.len() * 2 + 1);
        args.push(script.display().to_string());
        args.extend(params.to_args());

        WorkerCommand {
            program: self.config.interpreter.clone(),
            args,
        }
    }
}
