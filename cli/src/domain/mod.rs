//! Domain layer: agents, membership snapshots and request descriptions.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod agent;
pub mod error;
pub mod http;

pub use agent::{AgentDescriptor, AgentRole, MembershipSnapshot, RegistryRecord, Selection};
pub use error::{DiscoveryError, MembershipError, RequestError};
pub use http::{HttpMethod, RequestSpec, WrappedResponse};
