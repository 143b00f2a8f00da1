//! Host-backed environment

use anyhow::Result;
use nexus_core::{CommandOutput, EnvironmentKind};
use std::process::Command;
use tracing::debug;

use super::{Environment, EnvironmentState, append_output};

/// Runs commands through `sh -c` on the host
///
/// Local environments are transient: nothing outside the process backs them,
/// so renaming and destroying only touch in-memory state.
#[derive(Debug, Clone, Default)]
pub struct LocalEnvironment {
    state: EnvironmentState,
}

impl LocalEnvironment {
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self {
            state: EnvironmentState::new(working_directory),
        }
    }

    fn run_one(&self, command: &str) -> CommandOutput {
        debug!(
            "Running locally in {}: {}",
            self.state.working_directory, command
        );

        let result = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.state.working_directory)
            .envs(&self.state.variables)
            .output();

        match result {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).to_string();
                append_output(&mut text, &String::from_utf8_lossy(&output.stderr));
                CommandOutput::new(output.status.code().unwrap_or(-1), text)
            }
            Err(e) => CommandOutput::failure(format!("Failed to execute '{}': {}", command, e)),
        }
    }
}

impl Environment for LocalEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Local
    }

    fn name(&self) -> Option<&str> {
        self.state.name.as_deref()
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        if !name.is_empty() {
            self.state.name = Some(name.to_string());
        }
        Ok(())
    }

    fn working_directory(&self) -> &str {
        &self.state.working_directory
    }

    fn set_working_directory(&mut self, working_directory: &str) {
        self.state.working_directory = working_directory.to_string();
    }

    fn variable(&self, name: &str) -> Option<&str> {
        self.state.variables.get(name).map(String::as_str)
    }

    fn set_variable(&mut self, name: &str, value: &str) {
        self.state
            .variables
            .insert(name.to_string(), value.to_string());
    }

    fn run_commands(&mut self, commands: &[String]) -> CommandOutput {
        let mut exit_code = 0;
        let mut output = String::new();

        for command in commands {
            let result = self.run_one(command);
            exit_code = result.exit_code;
            append_output(&mut output, &result.output);
            if exit_code != 0 {
                break;
            }
        }

        CommandOutput::new(exit_code, output)
    }

    fn destroy(&mut self) -> CommandOutput {
        CommandOutput::default()
    }
}
