//! Fleet agent library: supervised command execution and the HTTP surface
//! that exposes it to the controller.
//!
//! Process groups and merged output pipes are unix facilities; the agent
//! does not build elsewhere.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod routes;
pub mod runner;

pub use error::{ActionError, RunnerError};
pub use runner::{CommandResult, ProcessRunner, TimeoutClass};
