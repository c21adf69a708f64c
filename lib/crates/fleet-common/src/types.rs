use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle action an agent can run against its managed service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Install,
    Uninstall,
    Start,
    Stop,
    Restart,
    Status,
}

impl LifecycleAction {
    pub const ALL: [LifecycleAction; 6] = [
        LifecycleAction::Install,
        LifecycleAction::Uninstall,
        LifecycleAction::Start,
        LifecycleAction::Stop,
        LifecycleAction::Restart,
        LifecycleAction::Status,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleAction::Install => "install",
            LifecycleAction::Uninstall => "uninstall",
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Restart => "restart",
            LifecycleAction::Status => "status",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown lifecycle action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for LifecycleAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// The two mutually exclusive roles an agent can hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Coordinator,
    Worker,
}

impl AgentRole {
    /// Any agent not flagged coordinator is a worker.
    #[must_use]
    pub fn from_coordinator_flag(is_coordinator: bool) -> Self {
        if is_coordinator {
            AgentRole::Coordinator
        } else {
            AgentRole::Worker
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Coordinator => f.write_str("coordinator"),
            AgentRole::Worker => f.write_str("worker"),
        }
    }
}

/// Optional parameters carried in a lifecycle request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleParams {
    /// Package location for `install`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

/// Body returned by the agent when a lifecycle command ran to completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub output: String,
}

/// Machine-readable error category in an agent error response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCommand,
    CommandTimeout,
    CommandExecution,
    UnknownAction,
}

/// Body returned by the agent when a lifecycle command did not complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}
