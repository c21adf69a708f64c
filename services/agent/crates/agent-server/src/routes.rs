//! HTTP surface of the agent.
//!
//!   - `GET  /health`                  → 200
//!   - `POST /v1/lifecycle/{action}`   → run a lifecycle command
//!
//! A completed command answers 200 with [`CommandOutcome`], whatever its
//! exit code. Anything else answers with an [`ErrorBody`] whose `kind`
//! tells the controller what went wrong.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use fleet_common::{
    AgentServerConfig, CommandOutcome, ErrorBody, ErrorKind, LifecycleAction, LifecycleParams,
};

use crate::error::ActionError;
use crate::lifecycle::LifecycleTable;
use crate::runner::ProcessRunner;

/// Shared state behind every request.
pub struct AppState {
    pub runner: ProcessRunner,
    pub table: LifecycleTable,
}

impl AppState {
    #[must_use]
    pub fn from_config(config: &AgentServerConfig) -> Self {
        Self {
            runner: ProcessRunner::from_config(config),
            table: LifecycleTable::from_config(config),
        }
    }

    /// Plan and run `action`, returning the finished command's outcome.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] if the action cannot be planned or the
    /// command does not run to completion.
    pub async fn run_action(
        &self,
        action: LifecycleAction,
        params: &LifecycleParams,
    ) -> Result<CommandOutcome, ActionError> {
        let planned = self.table.plan(action, params)?;
        let result = self.runner.execute(&planned.argv, planned.class).await?;
        Ok(CommandOutcome {
            exit_code: result.exit_code,
            output: result.output,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/lifecycle/{action}", post(lifecycle))
        .with_state(state)
}

/// Minimal health-check handler for load-balancer probes.
async fn health() -> StatusCode {
    StatusCode::OK
}

async fn lifecycle(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
    body: Bytes,
) -> Response {
    let action = match action.parse::<LifecycleAction>() {
        Ok(action) => action,
        Err(e) => {
            return error_response(StatusCode::NOT_FOUND, ErrorKind::UnknownAction, e.to_string());
        }
    };
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        LifecycleParams::default()
    } else {
        match serde_json::from_slice::<LifecycleParams>(&body) {
            Ok(params) => params,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorKind::InvalidCommand,
                    format!("Invalid request body: {e}"),
                );
            }
        }
    };

    tracing::info!(%action, ?params, "lifecycle request");
    match state.run_action(action, &params).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            let kind = e.kind();
            let status = match kind {
                ErrorKind::InvalidCommand => StatusCode::BAD_REQUEST,
                ErrorKind::CommandTimeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::CommandExecution => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::UnknownAction => StatusCode::NOT_FOUND,
            };
            let message = format!("{:#}", anyhow::Error::new(e));
            tracing::warn!(%action, ?kind, error = %message, "lifecycle request failed");
            error_response(status, kind, message)
        }
    }
}

fn error_response(status: StatusCode, kind: ErrorKind, error: String) -> Response {
    (status, Json(ErrorBody { error, kind })).into_response()
}
