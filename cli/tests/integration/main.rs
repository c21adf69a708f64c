//! Integration tests for the fleet controller
//!
//! These tests spawn the actual binary or talk to real HTTP servers on
//! loopback. They are slower and should be run separately from unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod http_transport;
