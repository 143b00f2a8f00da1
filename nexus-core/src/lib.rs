//! Nexus Core
//!
//! Core types shared by the Nexus provisioning crates.
//!
//! This crate contains:
//! - Domain types: properties, environment variants, deployment records
//! - Command results exchanged between execution contexts and steps

pub mod domain;
pub mod error;

pub use domain::command::CommandOutput;
pub use domain::deployment::DeploymentRecord;
pub use domain::environment::EnvironmentKind;
pub use domain::property::Property;
pub use error::DomainError;
