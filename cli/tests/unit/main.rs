//! Unit tests for the fleet controller
//!
//! These tests use fake ports and run fast without network I/O.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod architecture;
mod dispatch_service;
mod helpers;
