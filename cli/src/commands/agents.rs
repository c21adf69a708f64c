//! Agents command: list the fleet as the registry currently describes it.

use anyhow::{Context, Result};
use clap::Args;

use crate::application::ports::MembershipSource;
use crate::application::services::membership::MembershipResolver;
use crate::domain::{AgentDescriptor, AgentRole};

/// Arguments for the agents command.
#[derive(Args, Debug, Default)]
pub struct AgentsArgs {
    /// Only list agents holding this role
    #[arg(long, value_enum)]
    pub role: Option<AgentRole>,
}

/// Run the agents command.
///
/// # Errors
///
/// Returns an error if the registry cannot be read or holds a malformed
/// record.
pub async fn run<S: MembershipSource>(
    resolver: &MembershipResolver<S>,
    args: &AgentsArgs,
    json: bool,
) -> Result<()> {
    let snapshot = resolver.snapshot().await?;
    let agents: Vec<&AgentDescriptor> = snapshot
        .agents()
        .filter(|agent| args.role.is_none_or(|role| agent.role == role))
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&agents).context("JSON serialization failed")?;
        println!("{out}");
    } else {
        print!("{}", render_table(&agents));
    }
    Ok(())
}

/// Render agents as an aligned `ID ROLE ENDPOINT` table.
#[must_use]
pub fn render_table(agents: &[&AgentDescriptor]) -> String {
    if agents.is_empty() {
        return "No agents registered.\n".to_string();
    }
    let id_width = agents
        .iter()
        .map(|agent| agent.id.len())
        .chain(std::iter::once("ID".len()))
        .max()
        .unwrap_or_default();
    let role_width = "COORDINATOR".len();

    let mut out = format!("{:<id_width$}  {:<role_width$}  ENDPOINT\n", "ID", "ROLE");
    for agent in agents {
        out.push_str(&format!(
            "{:<id_width$}  {:<role_width$}  {}\n",
            agent.id,
            agent.role.to_string(),
            agent.endpoint
        ));
    }
    out
}
