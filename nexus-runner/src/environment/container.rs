//! Container-backed environment
//!
//! Keeps the environment's name in step with the container it wraps and
//! makes sure the container is reachable on the shared network.

use anyhow::Result;
use nexus_core::{CommandOutput, EnvironmentKind};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::runtime::ContainerRuntime;
use super::{BASE_DIRECTORY, Environment, EnvironmentFactory, EnvironmentState};

/// Network every Nexus container joins
pub const DEFAULT_NETWORK: &str = "nexus-net";

/// Image used for static site containers
pub const STATIC_HOST_IMAGE: &str = "d3lta12/nexus-static-host";

/// Image used for the shared reverse proxy
pub const REVERSE_PROXY_IMAGE: &str = "d3lta12/nexus-reverse-proxy";

/// How to find or start a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Requested name; empty asks for a generated one
    pub name: String,
    pub image: String,
    /// Shared network to join; empty skips network attachment
    pub network: String,
    /// (host, container) port pairs to publish
    pub ports: Vec<(u16, u16)>,
    pub working_directory: String,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            image: image.into(),
            network: DEFAULT_NETWORK.to_string(),
            ports: Vec::new(),
            working_directory: BASE_DIRECTORY.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn with_port(mut self, host: u16, container: u16) -> Self {
        self.ports.push((host, container));
        self
    }

    pub fn with_working_directory(mut self, working_directory: impl Into<String>) -> Self {
        self.working_directory = working_directory.into();
        self
    }
}

/// Environment whose commands run inside a named container
pub struct ContainerEnvironment {
    runtime: Arc<dyn ContainerRuntime>,
    state: EnvironmentState,
}

impl ContainerEnvironment {
    /// Reuses the container named by `spec` or starts a new one, then
    /// attaches it to the spec's network
    pub fn open(runtime: Arc<dyn ContainerRuntime>, spec: ContainerSpec) -> Result<Self> {
        let name = match runtime.find_container(&spec.name)? {
            Some(existing) => {
                info!("Reusing container {}", existing);
                existing
            }
            None => {
                let mut spec = spec.clone();
                if spec.name.is_empty() {
                    spec.name = generate_container_name();
                }
                runtime.run_container(&spec)?
            }
        };

        if !spec.network.is_empty() {
            if !runtime.network_exists(&spec.network)? {
                runtime.create_network(&spec.network)?;
            }
            if !runtime.is_connected(&name, &spec.network)? {
                runtime.connect_network(&name, &spec.network)?;
            }
        }

        let mut state = EnvironmentState::new(spec.working_directory);
        state.name = Some(name);

        Ok(Self { runtime, state })
    }
}

impl Environment for ContainerEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Container
    }

    fn name(&self) -> Option<&str> {
        self.state.name.as_deref()
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        let current = self.state.name.as_deref().unwrap_or_default();
        if name.is_empty() || name == current {
            return Ok(());
        }

        self.runtime.rename_container(current, name)?;
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
        let Some(container) = self.state.name.as_deref() else {
            return CommandOutput::failure("Container has no name");
        };

        let mut exit_code = 0;
        let mut output = String::new();

        for command in commands {
            let result = match self.runtime.exec(
                container,
                &self.state.working_directory,
                &self.state.variables,
                command,
            ) {
                Ok(result) => result,
                Err(e) => CommandOutput::failure(e.to_string()),
            };

            exit_code = result.exit_code;
            super::append_output(&mut output, &result.output);
            if exit_code != 0 {
                break;
            }
        }

        CommandOutput::new(exit_code, output)
    }

    fn destroy(&mut self) -> CommandOutput {
        let Some(container) = self.state.name.as_deref() else {
            return CommandOutput::failure("Container has no name");
        };

        match self.runtime.remove_container(container) {
            Ok(()) => CommandOutput::success(format!("Removed container {}", container)),
            Err(e) => {
                warn!("Failed to remove container {}: {}", container, e);
                CommandOutput::failure(e.to_string())
            }
        }
    }
}

/// Reopens containers for stored deployments
pub struct ContainerFactory {
    runtime: Arc<dyn ContainerRuntime>,
    template: ContainerSpec,
}

impl ContainerFactory {
    /// `template` supplies image, network and working directory; the stored
    /// name replaces its name
    pub fn new(runtime: Arc<dyn ContainerRuntime>, template: ContainerSpec) -> Self {
        Self { runtime, template }
    }
}

impl EnvironmentFactory for ContainerFactory {
    fn open(&self, kind: EnvironmentKind, name: &str) -> Result<Option<Box<dyn Environment>>> {
        match kind {
            EnvironmentKind::Container => {
                let spec = self.template.clone().with_name(name);
                let env = ContainerEnvironment::open(self.runtime.clone(), spec)?;
                Ok(Some(Box::new(env)))
            }
            EnvironmentKind::Local => {
                let mut env = super::LocalEnvironment::new(self.template.working_directory.clone());
                env.set_name(name)?;
                Ok(Some(Box::new(env)))
            }
        }
    }
}

/// Generates a unique container name
fn generate_container_name() -> String {
    format!("nexus-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRuntime;

    fn open(runtime: &Arc<FakeRuntime>, spec: ContainerSpec) -> ContainerEnvironment {
        ContainerEnvironment::open(runtime.clone(), spec).unwrap()
    }

    #[test]
    fn test_open_creates_missing_container() {
        let runtime = Arc::new(FakeRuntime::default());
        let env = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE).with_name("site"));

        assert_eq!(env.name(), Some("site"));
        assert_eq!(runtime.calls_matching("run:"), vec!["run:site:d3lta12/nexus-static-host"]);
    }

    #[test]
    fn test_open_reuses_existing_container() {
        let runtime = Arc::new(FakeRuntime::default());
        runtime.add_container("nexus-reverse-proxy", &[DEFAULT_NETWORK]);
        runtime.add_network(DEFAULT_NETWORK);

        let env = open(
            &runtime,
            ContainerSpec::new(REVERSE_PROXY_IMAGE).with_name("nexus-reverse-proxy"),
        );

        assert_eq!(env.name(), Some("nexus-reverse-proxy"));
        assert!(runtime.calls_matching("run:").is_empty());
        assert!(runtime.calls_matching("network-create:").is_empty());
        assert!(runtime.calls_matching("connect:").is_empty());
    }

    #[test]
    fn test_open_generates_unique_names() {
        let runtime = Arc::new(FakeRuntime::default());
        let first = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE));
        let second = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE));

        let first = first.name().unwrap().to_string();
        let second = second.name().unwrap().to_string();
        assert!(first.starts_with("nexus-"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_open_creates_network_and_connects() {
        let runtime = Arc::new(FakeRuntime::default());
        open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE).with_name("site"));

        assert_eq!(runtime.calls_matching("network-create:"), vec!["network-create:nexus-net"]);
        assert_eq!(runtime.calls_matching("connect:"), vec!["connect:site:nexus-net"]);
    }

    #[test]
    fn test_open_without_network_skips_attachment() {
        let runtime = Arc::new(FakeRuntime::default());
        open(
            &runtime,
            ContainerSpec::new(STATIC_HOST_IMAGE)
                .with_name("site")
                .with_network(""),
        );

        assert!(runtime.calls_matching("network").is_empty());
        assert!(runtime.calls_matching("connect:").is_empty());
    }

    #[test]
    fn test_rename_is_idempotent() {
        let runtime = Arc::new(FakeRuntime::default());
        let mut env = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE).with_name("site"));

        env.set_name("acme").unwrap();
        env.set_name("acme").unwrap();
        env.set_name("").unwrap();

        assert_eq!(env.name(), Some("acme"));
        assert_eq!(runtime.calls_matching("rename:"), vec!["rename:site:acme"]);
    }

    #[test]
    fn test_failed_rename_keeps_old_name() {
        let runtime = Arc::new(FakeRuntime::default());
        let mut env = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE).with_name("site"));
        runtime.fail_renames();

        assert!(env.set_name("acme").is_err());
        assert_eq!(env.name(), Some("site"));
    }

    #[test]
    fn test_exec_passes_directory_and_variables() {
        let runtime = Arc::new(FakeRuntime::default());
        let mut env = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE).with_name("site"));
        env.set_working_directory("/tmp/site");
        env.set_variable("MODE", "prod");

        let result = env.run_command("nginx -t");
        assert!(result.is_success());
        assert_eq!(
            runtime.calls_matching("exec:"),
            vec!["exec:site:/tmp/site:MODE=prod:nginx -t"]
        );
    }

    #[test]
    fn test_exec_stops_at_first_failure() {
        let runtime = Arc::new(FakeRuntime::default());
        runtime.respond("git fetch", CommandOutput::new(128, "no such branch"));
        let mut env = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE).with_name("site"));

        let result = env.run_commands(&[
            "git fetch origin dev".to_string(),
            "git checkout dev".to_string(),
        ]);
        assert_eq!(result.exit_code, 128);
        assert_eq!(result.output, "no such branch");
        assert_eq!(runtime.calls_matching("exec:").len(), 1);
    }

    #[test]
    fn test_destroy_removes_container() {
        let runtime = Arc::new(FakeRuntime::default());
        let mut env = open(&runtime, ContainerSpec::new(STATIC_HOST_IMAGE).with_name("site"));

        assert!(env.destroy().is_success());
        assert_eq!(runtime.calls_matching("remove:"), vec!["remove:site"]);
    }

    #[test]
    fn test_factory_reopens_by_name() {
        let runtime = Arc::new(FakeRuntime::default());
        runtime.add_container("acme", &[DEFAULT_NETWORK]);
        runtime.add_network(DEFAULT_NETWORK);
        let factory = ContainerFactory::new(runtime.clone(), ContainerSpec::new(STATIC_HOST_IMAGE));

        let env = factory
            .open(EnvironmentKind::Container, "acme")
            .unwrap()
            .unwrap();
        assert_eq!(env.kind(), EnvironmentKind::Container);
        assert_eq!(env.name(), Some("acme"));
        assert!(runtime.calls_matching("run:").is_empty());
    }
}
