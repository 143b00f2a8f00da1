use nexus_core::CommandOutput;
use std::path::Path;

use crate::environment::Environment;
use crate::step::{Effects, Step};

/// Renames the environment
pub struct SetName {
    name: String,
}

impl SetName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Step for SetName {
    fn name(&self) -> &str {
        "Set Name"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        match environment.set_name(&self.name) {
            Ok(()) => CommandOutput::default(),
            Err(e) => CommandOutput::failure(format!("Failed to set name {}: {}", self.name, e)),
        }
    }
}

/// Moves the working directory, relative to the current one
pub struct SetWorkingDirectory {
    working_directory: String,
}

impl SetWorkingDirectory {
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self {
            working_directory: working_directory.into(),
        }
    }
}

impl Step for SetWorkingDirectory {
    fn name(&self) -> &str {
        "Set Working Directory"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        let target = Path::new(environment.working_directory()).join(&self.working_directory);
        environment.set_working_directory(&target.to_string_lossy());
        CommandOutput::default()
    }
}

/// Releases the environment (removes its container)
#[derive(Default)]
pub struct DestroyEnvironment;

impl Step for DestroyEnvironment {
    fn name(&self) -> &str {
        "Destroy Environment"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        environment.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ContainerEnvironment;
    use crate::environment::ContainerSpec;
    use crate::step::execute;
    use crate::testing::{FakeEnvironment, FakeRuntime, RunLog};
    use nexus_core::EnvironmentKind;
    use std::sync::Arc;

    #[test]
    fn test_working_directory_is_relative() {
        let mut env = FakeEnvironment::default();
        env.set_working_directory("/tmp");

        execute(Box::new(SetWorkingDirectory::new("docs")), &mut env);
        assert_eq!(env.working_directory(), "/tmp/docs");

        execute(Box::new(SetWorkingDirectory::new("site")), &mut env);
        assert_eq!(env.working_directory(), "/tmp/docs/site");
    }

    #[test]
    fn test_set_name_renames_environment() {
        let log = RunLog::default();
        let mut env = FakeEnvironment::new(EnvironmentKind::Container, &log).named("nexus-1");

        let report = execute(Box::new(SetName::new("acme")), &mut env);
        assert!(report.is_success());
        assert_eq!(env.name(), Some("acme"));
    }

    #[test]
    fn test_set_name_failure_is_step_failure() {
        let runtime = Arc::new(FakeRuntime::default());
        let spec = ContainerSpec::new("image").with_name("old");
        let mut env = ContainerEnvironment::open(runtime.clone(), spec).unwrap();
        runtime.fail_renames();

        let report = execute(Box::new(SetName::new("acme")), &mut env);
        assert!(!report.is_success());
        assert!(report.output.contains("Failed to set name acme"));
    }

    #[test]
    fn test_destroy_reports_environment_result() {
        let log = RunLog::default();
        let mut env = FakeEnvironment::new(EnvironmentKind::Container, &log)
            .failing_destroy(CommandOutput::new(125, "no such container"));

        let report = execute(Box::new(DestroyEnvironment), &mut env);
        assert_eq!(report.exit_code, 125);
        assert_eq!(log.entries(), vec!["destroy"]);
    }
}
