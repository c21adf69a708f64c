//! Fleet controller library. Exposes modules for the `fleetctl` binary and
//! integration testing.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod output;
