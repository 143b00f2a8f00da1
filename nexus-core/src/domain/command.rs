//! Command result type

use serde::{Deserialize, Serialize};

/// Exit code used for failures that never reached an external command
pub const INTERNAL_FAILURE: i32 = -1;

/// Outcome of running one or more commands (or a step) in an environment
///
/// A zero exit code means success. Anything else is a failure whose meaning
/// is carried by `output`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }

    pub fn success(output: impl Into<String>) -> Self {
        Self::new(0, output)
    }

    /// A failure that did not come from an external command
    pub fn failure(output: impl Into<String>) -> Self {
        Self::new(INTERNAL_FAILURE, output)
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
