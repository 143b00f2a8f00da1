//! Execution environments
//!
//! An environment is the place a step's commands run. It carries a name, a
//! working directory and a set of variables that every later command sees.
//!
//! Two variants exist:
//! - `LocalEnvironment`: commands run on the host
//! - `ContainerEnvironment`: commands run inside a named container attached
//!   to the shared network

mod container;
mod local;
mod runtime;

pub use container::{
    ContainerEnvironment, ContainerFactory, ContainerSpec, DEFAULT_NETWORK, REVERSE_PROXY_IMAGE,
    STATIC_HOST_IMAGE,
};
pub use local::LocalEnvironment;
pub use runtime::{CliRuntime, ContainerRuntime};

use anyhow::Result;
use nexus_core::{CommandOutput, EnvironmentKind};
use std::collections::BTreeMap;

/// Default working directory for new environments
pub const BASE_DIRECTORY: &str = "/tmp";

/// Capabilities every step relies on
pub trait Environment: Send {
    /// Variant tag persisted alongside the deployment
    fn kind(&self) -> EnvironmentKind;

    /// Current name, if one has been set
    fn name(&self) -> Option<&str>;

    /// Renames the environment
    ///
    /// Implementations backed by an external resource must apply the rename
    /// there before reporting success.
    fn set_name(&mut self, name: &str) -> Result<()>;

    fn working_directory(&self) -> &str;

    fn set_working_directory(&mut self, working_directory: &str);

    fn variable(&self, name: &str) -> Option<&str>;

    fn set_variable(&mut self, name: &str, value: &str);

    fn set_variables(&mut self, variables: &BTreeMap<String, String>) {
        for (name, value) in variables {
            self.set_variable(name, value);
        }
    }

    /// Runs commands in order, stopping at the first non-zero exit
    fn run_commands(&mut self, commands: &[String]) -> CommandOutput;

    fn run_command(&mut self, command: &str) -> CommandOutput {
        self.run_commands(&[command.to_string()])
    }

    /// Releases whatever backs the environment
    fn destroy(&mut self) -> CommandOutput;
}

/// Builds environments for stored deployments
///
/// Returns `Ok(None)` for variants the factory does not support; those
/// deployments are skipped during reconstruction.
pub trait EnvironmentFactory {
    fn open(&self, kind: EnvironmentKind, name: &str) -> Result<Option<Box<dyn Environment>>>;
}

/// Name, working directory and variables shared by every variant
#[derive(Debug, Clone)]
pub(crate) struct EnvironmentState {
    pub name: Option<String>,
    pub working_directory: String,
    pub variables: BTreeMap<String, String>,
}

impl EnvironmentState {
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self {
            name: None,
            working_directory: working_directory.into(),
            variables: BTreeMap::new(),
        }
    }
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self::new(BASE_DIRECTORY)
    }
}

/// Appends one command's output to what earlier commands produced
pub(crate) fn append_output(accumulated: &mut String, output: &str) {
    if output.is_empty() {
        return;
    }
    if !accumulated.is_empty() && !accumulated.ends_with('\n') {
        accumulated.push('\n');
    }
    accumulated.push_str(output);
}
