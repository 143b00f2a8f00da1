use nexus_core::CommandOutput;

use crate::environment::Environment;
use crate::shell::quote_arg;
use crate::step::{Effects, Step};

/// Clones a repository into the working directory
pub struct GitClone {
    repository: String,
}

impl GitClone {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
        }
    }
}

impl Step for GitClone {
    fn name(&self) -> &str {
        "Git Clone"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        environment.run_command(&format!("git clone {} .", quote_arg(&self.repository)))
    }
}

/// Fetches and checks out a branch
pub struct GitCheckout {
    branch: String,
}

impl GitCheckout {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
        }
    }
}

impl Step for GitCheckout {
    fn name(&self) -> &str {
        "Git Checkout"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        let branch = quote_arg(&self.branch);
        environment.run_commands(&[
            format!("git fetch origin {}", branch),
            format!("git checkout {}", branch),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::execute;
    use crate::testing::{FakeEnvironment, RunLog};
    use nexus_core::EnvironmentKind;

    #[test]
    fn test_clone_into_working_directory() {
        let log = RunLog::default();
        let mut env = FakeEnvironment::new(EnvironmentKind::Container, &log);

        let report = execute(Box::new(GitClone::new("https://github.com/acme/site.git")), &mut env);
        assert!(report.is_success());
        assert_eq!(log.entries(), vec!["git clone https://github.com/acme/site.git ."]);
    }

    #[test]
    fn test_checkout_stops_when_fetch_fails() {
        let log = RunLog::default();
        let mut env = FakeEnvironment::new(EnvironmentKind::Container, &log)
            .respond("git fetch", CommandOutput::new(128, "couldn't find remote ref"));

        let report = execute(Box::new(GitCheckout::new("dev")), &mut env);
        assert_eq!(report.exit_code, 128);
        assert_eq!(log.entries(), vec!["git fetch origin dev"]);
    }

    #[test]
    fn test_checkout_runs_fetch_then_checkout() {
        let log = RunLog::default();
        let mut env = FakeEnvironment::new(EnvironmentKind::Container, &log);

        execute(Box::new(GitCheckout::new("release/1.0")), &mut env);
        assert_eq!(
            log.entries(),
            vec!["git fetch origin release/1.0", "git checkout release/1.0"]
        );
    }
}
