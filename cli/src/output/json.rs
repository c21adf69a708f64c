//! JSON output helpers.
//!
//! Provides the error-object formatter used by all `--json` code paths when
//! a command fails.

use anyhow::{Context, Result};

use crate::commands::lifecycle::LifecycleFailed;
use crate::domain::{DiscoveryError, MembershipError};

/// Format `err` as a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "...",
///   "report": { ... }
/// }
/// ```
///
/// `report` is present only for a failed lifecycle run and holds the
/// per-agent outcomes, so stdout stays a single JSON document.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(err: &anyhow::Error) -> Result<String> {
    let mut obj = serde_json::json!({
        "error": true,
        "message": format!("{err:#}"),
        "code": error_code(err),
    });
    if let Some(failed) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<LifecycleFailed>())
    {
        obj["report"] = serde_json::to_value(&failed.report).context("JSON serialization failed")?;
    }
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable code for the outermost typed error in `err`'s chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<MembershipError>() {
            return match e {
                MembershipError::UnknownAgents { .. } => "UNKNOWN_AGENTS",
                MembershipError::Discovery(d) => discovery_code(d),
            };
        }
        if let Some(d) = cause.downcast_ref::<DiscoveryError>() {
            return discovery_code(d);
        }
        if cause.is::<LifecycleFailed>() {
            return "LIFECYCLE_FAILED";
        }
    }
    "ERROR"
}

fn discovery_code(err: &DiscoveryError) -> &'static str {
    match err {
        DiscoveryError::Source(_) => "REGISTRY_UNAVAILABLE",
        DiscoveryError::InvalidAddress { .. }
        | DiscoveryError::MissingAddress { .. }
        | DiscoveryError::DuplicateId(_) => "INVALID_REGISTRY",
    }
}
