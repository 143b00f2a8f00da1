//! Container runtime access
//!
//! Handles the container lifecycle the environments rely on:
//! - Looking up containers by name and starting new ones
//! - Renaming and removing containers
//! - Creating the shared network and attaching containers to it
//! - Executing commands inside a container

use anyhow::{Context, Result};
use nexus_core::CommandOutput;
use std::collections::BTreeMap;
use std::process::{Command, Output};
use tracing::{debug, error, info};

use super::append_output;
use super::container::ContainerSpec;

/// Operations a container runtime must provide
pub trait ContainerRuntime: Send + Sync {
    /// Returns the container's current name if a container answers to `name`
    fn find_container(&self, name: &str) -> Result<Option<String>>;

    /// Starts a detached container and returns its name
    fn run_container(&self, spec: &ContainerSpec) -> Result<String>;

    fn rename_container(&self, from: &str, to: &str) -> Result<()>;

    fn remove_container(&self, name: &str) -> Result<()>;

    fn network_exists(&self, network: &str) -> Result<bool>;

    fn create_network(&self, network: &str) -> Result<()>;

    fn is_connected(&self, container: &str, network: &str) -> Result<bool>;

    fn connect_network(&self, container: &str, network: &str) -> Result<()>;

    /// Runs `sh -c <command>` inside the container
    fn exec(
        &self,
        container: &str,
        working_directory: &str,
        variables: &BTreeMap<String, String>,
        command: &str,
    ) -> Result<CommandOutput>;
}

/// Runtime driven through a podman-compatible command line
///
/// Works with `podman` and `docker`, which share the subcommands used here.
#[derive(Debug, Clone)]
pub struct CliRuntime {
    binary: String,
}

impl CliRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Checks that the runtime binary is installed and working
    pub fn check_available(&self) -> Result<()> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .with_context(|| {
                format!("Failed to execute '{} --version'. Is it installed?", self.binary)
            })?;

        if !output.status.success() {
            anyhow::bail!("{} is not working correctly", self.binary);
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!("Container runtime is available: {}", version.trim());

        Ok(())
    }

    fn command(&self) -> Command {
        Command::new(&self.binary)
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        debug!("Running: {} {}", self.binary, args.join(" "));
        self.command()
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute {} {}", self.binary, args.join(" ")))
    }

    /// Runs a command that must succeed
    fn checked(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let error_msg = format!(
                "{} {} failed: exit_code={}, stdout='{}', stderr='{}'",
                self.binary,
                args.join(" "),
                output.status.code().unwrap_or(-1),
                stdout,
                stderr.trim()
            );
            error!("{}", error_msg);
            anyhow::bail!("{}", error_msg);
        }

        Ok(stdout)
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        Self::new("podman")
    }
}

impl ContainerRuntime for CliRuntime {
    fn find_container(&self, name: &str) -> Result<Option<String>> {
        if name.is_empty() {
            return Ok(None);
        }

        let output = self.output(&["container", "inspect", "--format", "{{.Name}}", name])?;
        if !output.status.success() {
            debug!("No container named {}", name);
            return Ok(None);
        }

        // docker reports names with a leading slash
        let found = String::from_utf8_lossy(&output.stdout)
            .trim()
            .trim_start_matches('/')
            .to_string();
        Ok(Some(found))
    }

    fn run_container(&self, spec: &ContainerSpec) -> Result<String> {
        info!("Creating container {} for image {}", spec.name, spec.image);

        let ports: Vec<String> = spec
            .ports
            .iter()
            .map(|(host, container)| format!("{}:{}", host, container))
            .collect();

        let mut args = vec!["run", "-d", "--name", spec.name.as_str()];
        for port in &ports {
            args.push("-p");
            args.push(port);
        }
        args.push(&spec.image);

        let container_id = self.checked(&args)?;
        info!(
            "Container {} started successfully with ID: {}",
            spec.name, container_id
        );

        Ok(spec.name.clone())
    }

    fn rename_container(&self, from: &str, to: &str) -> Result<()> {
        self.checked(&["rename", from, to])?;
        info!("Container {} renamed to {}", from, to);
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<()> {
        self.checked(&["rm", "-f", name])?;
        info!("Container {} removed", name);
        Ok(())
    }

    fn network_exists(&self, network: &str) -> Result<bool> {
        let output = self.output(&["network", "inspect", network])?;
        Ok(output.status.success())
    }

    fn create_network(&self, network: &str) -> Result<()> {
        self.checked(&["network", "create", network])?;
        info!("Network {} created", network);
        Ok(())
    }

    fn is_connected(&self, container: &str, network: &str) -> Result<bool> {
        let networks = self.checked(&[
            "container",
            "inspect",
            "--format",
            "{{json .NetworkSettings.Networks}}",
            container,
        ])?;

        let parsed: serde_json::Value = serde_json::from_str(&networks)
            .with_context(|| {
                format!("Unexpected network listing for {}: {}", container, networks)
            })?;

        Ok(parsed
            .as_object()
            .is_some_and(|map| map.contains_key(network)))
    }

    fn connect_network(&self, container: &str, network: &str) -> Result<()> {
        self.checked(&["network", "connect", network, container])?;
        info!("Container {} connected to network {}", container, network);
        Ok(())
    }

    fn exec(
        &self,
        container: &str,
        working_directory: &str,
        variables: &BTreeMap<String, String>,
        command: &str,
    ) -> Result<CommandOutput> {
        let mut cmd = self.command();
        cmd.arg("exec");
        if !working_directory.is_empty() {
            cmd.arg("-w").arg(working_directory);
        }
        for (name, value) in variables {
            cmd.arg("-e").arg(format!("{}={}", name, value));
        }
        cmd.arg(container).arg("sh").arg("-c").arg(command);

        debug!("Executing in container {}: {}", container, command);

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute {} exec", self.binary))?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        append_output(&mut text, &String::from_utf8_lossy(&output.stderr));
        let exit_code = output.status.code().unwrap_or(1);

        if !output.status.success() {
            debug!(
                "Command failed in container {}: exit_code={} output='{}'",
                container,
                exit_code,
                text.trim()
            );
        }

        Ok(CommandOutput::new(exit_code, text))
    }
}
