//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use anyhow::Result;
use url::Url;

use crate::domain::{RegistryRecord, RequestSpec, WrappedResponse};

/// A registry that can list every agent it knows about.
#[allow(async_fn_in_trait)]
pub trait MembershipSource {
    /// Fetch the complete current listing.
    ///
    /// Every call must return the full set; the resolver replaces its
    /// snapshot wholesale with whatever this returns.
    async fn fetch(&self) -> Result<Vec<RegistryRecord>>;
}

/// Sends one described request to one agent.
#[allow(async_fn_in_trait)]
pub trait AgentTransport {
    /// Send `request` to the agent rooted at `base`.
    ///
    /// Any HTTP status is a successful send; only transport failures and
    /// unresolvable requests are errors.
    async fn send(&self, base: &Url, request: &RequestSpec) -> Result<WrappedResponse>;
}
