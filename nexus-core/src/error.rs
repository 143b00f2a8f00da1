//! Error types for the core domain

use thiserror::Error;

/// Errors raised while interpreting stored or reported domain values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// A property key outside the recognized set
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// An environment tag no variant answers to
    #[error("Unknown environment kind: {0}")]
    UnknownEnvironment(String),
}
