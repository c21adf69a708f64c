//! Lifecycle command: run one action on a selection of agents.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use fleet_common::{CommandOutcome, LifecycleAction, LifecycleParams};
use thiserror::Error;

use crate::application::ports::{AgentTransport, MembershipSource};
use crate::application::services::dispatch::{
    AgentOutcome, DispatchReport, dispatch, lifecycle_request,
};
use crate::application::services::membership::MembershipResolver;
use crate::domain::Selection;

/// Arguments for the lifecycle command.
#[derive(Args, Debug)]
pub struct LifecycleArgs {
    /// Action to run on each selected agent
    #[arg(value_enum)]
    pub action: LifecycleAction,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Package file or name for install/uninstall
    #[arg(long)]
    pub package: Option<String>,
}

/// Which agents to address; exactly one must be given.
#[derive(Args, Debug, Default)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Every registered agent
    #[arg(long)]
    pub all: bool,

    /// Coordinator agents only
    #[arg(long)]
    pub coordinators: bool,

    /// Worker agents only
    #[arg(long)]
    pub workers: bool,

    /// Specific agents by ID (repeatable)
    #[arg(long = "node", value_name = "ID")]
    pub nodes: Vec<String>,
}

impl TargetArgs {
    #[must_use]
    pub fn selection(&self) -> Selection {
        if self.coordinators {
            Selection::Coordinators
        } else if self.workers {
            Selection::Workers
        } else if !self.nodes.is_empty() {
            Selection::Ids(self.nodes.clone())
        } else {
            Selection::All
        }
    }
}

/// One or more agents did not complete the action.
///
/// Carries the full report so `--json` output can embed it in the error
/// object.
#[derive(Debug, Error)]
#[error(
    "{action} failed on {} of {} agent(s): {}",
    .failed.len(),
    .report.len(),
    .failed.join(", ")
)]
pub struct LifecycleFailed {
    pub action: LifecycleAction,
    pub failed: Vec<String>,
    pub report: DispatchReport,
}

/// Run the lifecycle command.
///
/// `timeout` bounds each agent request. In `--json` mode a failed run prints
/// nothing here; the report is part of the error object instead.
///
/// # Errors
///
/// Returns an error if the selection cannot be resolved, or
/// [`LifecycleFailed`] if any agent failed.
pub async fn run<S, T>(
    resolver: &MembershipResolver<S>,
    transport: &T,
    args: &LifecycleArgs,
    timeout: Duration,
    json: bool,
) -> Result<()>
where
    S: MembershipSource,
    T: AgentTransport,
{
    let params = LifecycleParams {
        package: args.package.clone(),
    };
    let request = lifecycle_request(args.action, &params, timeout)
        .context("failed to encode lifecycle request")?;
    let report = dispatch(resolver, transport, &args.target.selection(), &request).await?;
    let failed = unsuccessful_agents(&report);

    if json {
        if failed.is_empty() {
            let out =
                serde_json::to_string_pretty(&report).context("JSON serialization failed")?;
            println!("{out}");
        }
    } else {
        print!("{}", render_report(&report));
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(LifecycleFailed {
            action: args.action,
            failed,
            report,
        }
        .into())
    }
}

/// Agents that failed to answer, answered with an error status, or ran the
/// command to a non-zero exit.
#[must_use]
pub fn unsuccessful_agents(report: &DispatchReport) -> Vec<String> {
    report
        .outcomes
        .iter()
        .filter(|(_, outcome)| match outcome {
            AgentOutcome::Response(response) if response.is_success() => {
                command_outcome(&response.body).is_some_and(|o| o.exit_code != 0)
            }
            _ => true,
        })
        .map(|(id, _)| id.clone())
        .collect()
}

/// Human-readable report, one block per agent.
#[must_use]
pub fn render_report(report: &DispatchReport) -> String {
    if report.is_empty() {
        return "No agents selected.\n".to_string();
    }
    let mut out = String::new();
    for (id, outcome) in &report.outcomes {
        match outcome {
            AgentOutcome::Failed(message) => {
                out.push_str(&format!("{id}: request failed: {message}\n"));
            }
            AgentOutcome::Response(response) => {
                if let Some(result) = command_outcome(&response.body) {
                    out.push_str(&format!("{id}: exit {}\n", result.exit_code));
                    push_indented(&mut out, &result.output);
                } else if let Some(error) = response.body.get("error").and_then(|e| e.as_str()) {
                    out.push_str(&format!(
                        "{id}: {} {}: {error}\n",
                        response.status, response.reason_phrase
                    ));
                } else {
                    out.push_str(&format!(
                        "{id}: {} {}\n",
                        response.status, response.reason_phrase
                    ));
                    match &response.body {
                        serde_json::Value::String(text) => push_indented(&mut out, text),
                        serde_json::Value::Null => {}
                        other => push_indented(&mut out, &other.to_string()),
                    }
                }
            }
        }
    }
    out
}

fn command_outcome(body: &serde_json::Value) -> Option<CommandOutcome> {
    serde_json::from_value(body.clone()).ok()
}

fn push_indented(out: &mut String, text: &str) {
    for line in text.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
}
