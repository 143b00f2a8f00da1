use nexus_core::CommandOutput;

use crate::environment::Environment;
use crate::step::{Effects, Step};

/// Runs the site's build command through the shell
pub struct BuildSource {
    build_command: String,
}

impl BuildSource {
    pub fn new(build_command: impl Into<String>) -> Self {
        Self {
            build_command: build_command.into(),
        }
    }
}

impl Step for BuildSource {
    fn name(&self) -> &str {
        "Build Source"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        environment.run_command(&self.build_command)
    }
}
