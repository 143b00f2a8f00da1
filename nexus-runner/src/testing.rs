//! Test doubles for environments, runtimes and steps

use anyhow::Result;
use nexus_core::{CommandOutput, EnvironmentKind};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::environment::{
    ContainerRuntime, ContainerSpec, Environment, EnvironmentFactory, EnvironmentState,
};
use crate::step::{Effects, Step};

/// Shared, ordered record of what ran
#[derive(Debug, Clone, Default)]
pub struct RunLog(Arc<Mutex<Vec<String>>>);

impl RunLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Step that records its name when run and returns a canned result
pub struct RecordingStep {
    name: String,
    log: RunLog,
    result: CommandOutput,
    follow_ups: Vec<RecordingStep>,
    properties: Vec<(String, String)>,
}

impl RecordingStep {
    pub fn new(name: &str, log: &RunLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            result: CommandOutput::success(format!("{} done", name)),
            follow_ups: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn failing(mut self, exit_code: i32, output: &str) -> Self {
        self.result = CommandOutput::new(exit_code, output);
        self
    }

    pub fn with_follow_ups(mut self, follow_ups: Vec<RecordingStep>) -> Self {
        self.follow_ups = follow_ups;
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.push((key.to_string(), value.to_string()));
        self
    }
}

impl Step for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_action(
        &mut self,
        _environment: &mut dyn Environment,
        effects: &mut Effects,
    ) -> CommandOutput {
        self.log.push(self.name.clone());
        for step in self.follow_ups.drain(..) {
            effects.push_step(step);
        }
        for (key, value) in &self.properties {
            effects.set_property(key.clone(), value.clone());
        }
        self.result.clone()
    }
}

/// Environment that records commands and answers from a script
///
/// A command gets the response of the first pattern it contains, or an
/// empty success.
pub struct FakeEnvironment {
    kind: EnvironmentKind,
    state: EnvironmentState,
    responses: Vec<(String, CommandOutput)>,
    destroy_result: CommandOutput,
    log: RunLog,
}

impl FakeEnvironment {
    pub fn new(kind: EnvironmentKind, log: &RunLog) -> Self {
        Self {
            kind,
            state: EnvironmentState::default(),
            responses: Vec::new(),
            destroy_result: CommandOutput::default(),
            log: log.clone(),
        }
    }

    pub fn respond(mut self, pattern: &str, output: CommandOutput) -> Self {
        self.responses.push((pattern.to_string(), output));
        self
    }

    pub fn failing_destroy(mut self, output: CommandOutput) -> Self {
        self.destroy_result = output;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.state.name = Some(name.to_string());
        self
    }
}

impl Default for FakeEnvironment {
    fn default() -> Self {
        Self::new(EnvironmentKind::Local, &RunLog::default())
    }
}

impl Environment for FakeEnvironment {
    fn kind(&self) -> EnvironmentKind {
        self.kind
    }

    fn name(&self) -> Option<&str> {
        self.state.name.as_deref()
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        if name.is_empty() || self.state.name.as_deref() == Some(name) {
            return Ok(());
        }
        self.log.push(format!("set_name:{}", name));
        self.state.name = Some(name.to_string());
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
        let mut last = CommandOutput::default();
        for command in commands {
            self.log.push(command.clone());
            last = self
                .responses
                .iter()
                .find(|(pattern, _)| command.contains(pattern.as_str()))
                .map(|(_, output)| output.clone())
                .unwrap_or_default();
            if !last.is_success() {
                break;
            }
        }
        last
    }

    fn destroy(&mut self) -> CommandOutput {
        self.log.push("destroy");
        self.destroy_result.clone()
    }
}

/// Factory that hands out fake environments and records what it opened
#[derive(Default)]
pub struct FakeFactory {
    pub opened: RunLog,
}

impl EnvironmentFactory for FakeFactory {
    fn open(&self, kind: EnvironmentKind, name: &str) -> Result<Option<Box<dyn Environment>>> {
        self.opened.push(format!("{}:{}", kind, name));
        Ok(Some(Box::new(
            FakeEnvironment::new(kind, &RunLog::default()).named(name),
        )))
    }
}

#[derive(Default)]
struct RuntimeState {
    containers: HashMap<String, Vec<String>>,
    networks: HashSet<String>,
    responses: Vec<(String, CommandOutput)>,
    fail_renames: bool,
    calls: Vec<String>,
}

/// In-memory container runtime
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<RuntimeState>,
}

impl FakeRuntime {
    pub fn add_container(&self, name: &str, networks: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.containers.insert(
            name.to_string(),
            networks.iter().map(|n| n.to_string()).collect(),
        );
    }

    pub fn add_network(&self, network: &str) {
        self.state.lock().unwrap().networks.insert(network.to_string());
    }

    pub fn respond(&self, pattern: &str, output: CommandOutput) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push((pattern.to_string(), output));
    }

    pub fn fail_renames(&self) {
        self.state.lock().unwrap().fail_renames = true;
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl ContainerRuntime for FakeRuntime {
    fn find_container(&self, name: &str) -> Result<Option<String>> {
        self.record(format!("find:{}", name));
        let state = self.state.lock().unwrap();
        Ok(state.containers.contains_key(name).then(|| name.to_string()))
    }

    fn run_container(&self, spec: &ContainerSpec) -> Result<String> {
        self.record(format!("run:{}:{}", spec.name, spec.image));
        self.state
            .lock()
            .unwrap()
            .containers
            .insert(spec.name.clone(), Vec::new());
        Ok(spec.name.clone())
    }

    fn rename_container(&self, from: &str, to: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_renames {
            anyhow::bail!("rename {} failed", from);
        }
        state.calls.push(format!("rename:{}:{}", from, to));
        let networks = state.containers.remove(from).unwrap_or_default();
        state.containers.insert(to.to_string(), networks);
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<()> {
        self.record(format!("remove:{}", name));
        self.state.lock().unwrap().containers.remove(name);
        Ok(())
    }

    fn network_exists(&self, network: &str) -> Result<bool> {
        self.record(format!("network-exists:{}", network));
        Ok(self.state.lock().unwrap().networks.contains(network))
    }

    fn create_network(&self, network: &str) -> Result<()> {
        self.record(format!("network-create:{}", network));
        self.add_network(network);
        Ok(())
    }

    fn is_connected(&self, container: &str, network: &str) -> Result<bool> {
        self.record(format!("is-connected:{}:{}", container, network));
        let state = self.state.lock().unwrap();
        Ok(state
            .containers
            .get(container)
            .is_some_and(|networks| networks.iter().any(|n| n == network)))
    }

    fn connect_network(&self, container: &str, network: &str) -> Result<()> {
        self.record(format!("connect:{}:{}", container, network));
        let mut state = self.state.lock().unwrap();
        if let Some(networks) = state.containers.get_mut(container) {
            networks.push(network.to_string());
        }
        Ok(())
    }

    fn exec(
        &self,
        container: &str,
        working_directory: &str,
        variables: &BTreeMap<String, String>,
        command: &str,
    ) -> Result<CommandOutput> {
        let vars: Vec<String> = variables
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        self.record(format!(
            "exec:{}:{}:{}:{}",
            container,
            working_directory,
            vars.join(","),
            command
        ));

        let state = self.state.lock().unwrap();
        Ok(state
            .responses
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }
}
