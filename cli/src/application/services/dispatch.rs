//! Application service: fan one request out to a selection of agents.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeMap;
use std::time::Duration;

use fleet_common::{LifecycleAction, LifecycleParams};
use futures::future::join_all;
use serde::Serialize;

use crate::application::ports::{AgentTransport, MembershipSource};
use crate::application::services::membership::MembershipResolver;
use crate::domain::http::APPLICATION_JSON;
use crate::domain::{HttpMethod, MembershipError, RequestSpec, Selection, WrappedResponse};

/// What came back from one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentOutcome {
    /// The agent answered; the status may still be an error status.
    Response(WrappedResponse),
    /// The request never produced a response.
    Failed(String),
}

impl AgentOutcome {
    #[must_use]
    pub fn response(&self) -> Option<&WrappedResponse> {
        match self {
            AgentOutcome::Response(response) => Some(response),
            AgentOutcome::Failed(_) => None,
        }
    }
}

/// Per-agent outcomes of one dispatch, keyed by agent id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DispatchReport {
    pub outcomes: BTreeMap<String, AgentOutcome>,
}

impl DispatchReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }
}

/// Build the request that runs `action` on an agent.
///
/// `timeout` bounds the whole exchange and has to exceed the agent's own
/// command deadline; otherwise a slow command is reported as a transport
/// failure while it is still running.
///
/// # Errors
///
/// Returns an error if `params` cannot be encoded as JSON.
pub fn lifecycle_request(
    action: LifecycleAction,
    params: &LifecycleParams,
    timeout: Duration,
) -> serde_json::Result<RequestSpec> {
    let mut request = RequestSpec::new(HttpMethod::Post, "/v1/lifecycle/{action}");
    request
        .path_params
        .insert("action".to_string(), action.as_str().to_string());
    request.body = Some(serde_json::to_value(params)?);
    request.accept = APPLICATION_JSON.to_string();
    request.timeout = Some(timeout);
    Ok(request)
}

/// Send `request` to every agent in `selection`, concurrently.
///
/// Membership errors abort before anything is sent. After that, one agent's
/// failure is recorded in the report and never affects the others.
///
/// # Errors
///
/// Returns an error if the selection cannot be resolved.
pub async fn dispatch<S, T>(
    resolver: &MembershipResolver<S>,
    transport: &T,
    selection: &Selection,
    request: &RequestSpec,
) -> Result<DispatchReport, MembershipError>
where
    S: MembershipSource,
    T: AgentTransport,
{
    let targets = resolver.resolve(selection).await?;
    tracing::debug!(targets = targets.len(), path = %request.path, "dispatching");

    let sends = targets.into_iter().map(|(id, base)| async move {
        let outcome = match transport.send(&base, request).await {
            Ok(response) => AgentOutcome::Response(response),
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(agent = %id, error = %message, "request failed");
                AgentOutcome::Failed(message)
            }
        };
        (id, outcome)
    });

    Ok(DispatchReport {
        outcomes: join_all(sends).await.into_iter().collect(),
    })
}
