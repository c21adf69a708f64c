//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Discovery errors ──────────────────────────────────────────────────────────

/// A registry fetch could not be turned into a membership snapshot.
///
/// Raising any of these leaves the resolver holding an empty snapshot.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid URI '{raw}' for node with ID '{id}'")]
    InvalidAddress {
        id: String,
        raw: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Node with ID '{id}' has no '{key}' address property")]
    MissingAddress { id: String, key: &'static str },

    #[error("Duplicate node ID '{0}' in registry")]
    DuplicateId(String),

    #[error("Registry fetch failed")]
    Source(#[source] anyhow::Error),
}

// ── Membership errors ─────────────────────────────────────────────────────────

/// Errors returned by membership queries.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Invalid or duplicate node ID (unknown: {}; duplicated: {})", list(.unknown), list(.duplicated))]
    UnknownAgents {
        unknown: Vec<String>,
        duplicated: Vec<String>,
    },
}

// ── Request errors ────────────────────────────────────────────────────────────

/// A request description could not be turned into a target URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("No value for template '{{{name}}}' in path '{path}'")]
    UnresolvedTemplate { path: String, name: String },

    #[error("Unterminated template in path '{0}'")]
    UnterminatedTemplate(String),

    #[error("Cannot use '{0}' as a base URI")]
    InvalidBase(String),
}

fn list(ids: &[String]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.join(", ")
    }
}
