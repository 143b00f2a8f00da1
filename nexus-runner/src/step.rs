//! Step contract
//!
//! A step is one unit of work against an environment. Running it may
//! produce follow-up steps and property reports, which the owning
//! deployment consumes right after the run.

use nexus_core::CommandOutput;
use tracing::{error, info};

use crate::environment::Environment;

/// One unit of work in a deployment
pub trait Step: Send {
    fn name(&self) -> &str;

    /// Performs the work and reports its outcome
    ///
    /// A non-zero exit code marks failure; the step decides what each code
    /// means. Anything pushed into `effects` is discarded on failure.
    fn run_action(&mut self, environment: &mut dyn Environment, effects: &mut Effects)
    -> CommandOutput;
}

/// Follow-up steps and property reports collected while a step runs
#[derive(Default)]
pub struct Effects {
    next_steps: Vec<Box<dyn Step>>,
    properties: Vec<(String, String)>,
}

impl Effects {
    /// Queues a follow-up step; follow-ups run in the order they are pushed
    pub fn push_step(&mut self, step: impl Step + 'static) {
        self.next_steps.push(Box::new(step));
    }

    /// Reports a property by key; unrecognized keys are dropped downstream
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.push((key.into(), value.into()));
    }

    pub fn next_step_names(&self) -> Vec<&str> {
        self.next_steps.iter().map(|s| s.name()).collect()
    }
}

/// Everything a finished step hands back to its deployment
pub struct StepReport {
    pub name: String,
    pub exit_code: i32,
    pub output: String,
    pub next_steps: Vec<Box<dyn Step>>,
    pub properties: Vec<(String, String)>,
}

impl StepReport {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn command_output(&self) -> CommandOutput {
        CommandOutput::new(self.exit_code, self.output.clone())
    }
}

impl std::fmt::Debug for StepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepReport")
            .field("name", &self.name)
            .field("exit_code", &self.exit_code)
            .field("output", &self.output)
            .field(
                "next_steps",
                &self.next_steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("properties", &self.properties)
            .finish()
    }
}

/// Runs a step once and collects its report
///
/// Consumes the step: a step never runs twice.
pub fn execute(mut step: Box<dyn Step>, environment: &mut dyn Environment) -> StepReport {
    let name = step.name().to_string();
    info!("Step: {}", name);

    let mut effects = Effects::default();
    let result = step.run_action(environment, &mut effects);

    if result.is_success() {
        info!("Success");
    } else {
        error!(
            "Failure\nExit code: {}\nError message: {}\nDirectory: {}",
            result.exit_code,
            result.output,
            environment.working_directory()
        );
        effects = Effects::default();
    }

    StepReport {
        name,
        exit_code: result.exit_code,
        output: result.output,
        next_steps: effects.next_steps,
        properties: effects.properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEnvironment, RecordingStep, RunLog};

    #[test]
    fn test_success_keeps_effects() {
        let log = RunLog::default();
        let step = RecordingStep::new("parent", &log)
            .with_follow_ups(vec![RecordingStep::new("child", &log)])
            .with_property("DOMAIN", "acme.io");

        let mut env = FakeEnvironment::default();
        let report = execute(Box::new(step), &mut env);

        assert!(report.is_success());
        assert_eq!(report.name, "parent");
        assert_eq!(report.next_steps.len(), 1);
        assert_eq!(report.next_steps[0].name(), "child");
        assert_eq!(
            report.properties,
            vec![("DOMAIN".to_string(), "acme.io".to_string())]
        );
    }

    #[test]
    fn test_failure_discards_effects() {
        let log = RunLog::default();
        let step = RecordingStep::new("parent", &log)
            .failing(2, "boom")
            .with_follow_ups(vec![RecordingStep::new("child", &log)])
            .with_property("DOMAIN", "acme.io");

        let mut env = FakeEnvironment::default();
        let report = execute(Box::new(step), &mut env);

        assert!(!report.is_success());
        assert_eq!(report.command_output(), CommandOutput::new(2, "boom"));
        assert!(report.next_steps.is_empty());
        assert!(report.properties.is_empty());
    }

    #[test]
    fn test_effects_keep_push_order() {
        let log = RunLog::default();
        let mut effects = Effects::default();
        effects.push_step(RecordingStep::new("a", &log));
        effects.push_step(RecordingStep::new("b", &log));
        assert_eq!(effects.next_step_names(), vec!["a", "b"]);
    }
}
