//! Core domain types
//!
//! These types are shared between the runner (which executes steps against
//! an environment) and the store (which persists finished deployments).

pub mod command;
pub mod deployment;
pub mod environment;
pub mod property;
