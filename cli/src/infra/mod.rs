//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: registry reads, discovery
//! queries, and HTTP calls to agents.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod http;
pub mod registry;
pub mod response;

pub use http::ReqwestTransport;
pub use registry::{ConfiguredSource, DiscoveryClient, StaticRegistry};
