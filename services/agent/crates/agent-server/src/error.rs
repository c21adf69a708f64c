//! Typed errors for supervised command execution.

use std::io;
use std::time::Duration;

use fleet_common::{ErrorKind, LifecycleAction};
use thiserror::Error;

/// Failure of a single [`crate::runner::ProcessRunner`] call.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The command had no tokens. Checked before anything is spawned.
    #[error("Command array is empty; no command given")]
    InvalidCommand,

    /// The process overran its deadline and has already been killed.
    #[error("Command timed out after {}s: {command}", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    /// Spawning, reading output, or supervising the process failed.
    #[error("Error executing command: {command}")]
    Execution {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Failure of a lifecycle request before or during execution.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action '{0}' requires a package")]
    MissingPackage(LifecycleAction),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl ActionError {
    /// Wire category reported to the controller.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::MissingPackage(_) | ActionError::Runner(RunnerError::InvalidCommand) => {
                ErrorKind::InvalidCommand
            }
            ActionError::Runner(RunnerError::Timeout { .. }) => ErrorKind::CommandTimeout,
            ActionError::Runner(RunnerError::Execution { .. }) => ErrorKind::CommandExecution,
        }
    }
}
