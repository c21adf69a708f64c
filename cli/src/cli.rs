//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fleet_common::ControllerConfig;
use url::Url;

use crate::application::services::membership::MembershipResolver;
use crate::commands;
use crate::infra::{ConfiguredSource, DiscoveryClient, ReqwestTransport, StaticRegistry};

/// Discover fleet agents and run lifecycle actions on them
#[derive(Parser, Debug)]
#[command(
    name = "fleetctl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Read the agent registry from this YAML or JSON file
    #[arg(
        long,
        global = true,
        env = "FLEET_REGISTRY_FILE",
        value_name = "PATH",
        conflicts_with = "discovery_uri"
    )]
    pub registry_file: Option<PathBuf>,

    /// Query the agent registry from this discovery service
    #[arg(long, global = true, env = "FLEET_DISCOVERY_URI", value_name = "URI")]
    pub discovery_uri: Option<Url>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered agents
    Agents(commands::agents::AgentsArgs),

    /// Run a lifecycle action on selected agents
    Lifecycle(commands::lifecycle::LifecycleArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid, or if the
    /// command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            registry_file,
            discovery_uri,
            command,
        } = self;
        match command {
            Command::Version => commands::version::run(json),
            Command::Agents(args) => {
                let config = controller_config()?;
                let source = membership_source(registry_file, discovery_uri, &config)?;
                let resolver = MembershipResolver::new(source);
                commands::agents::run(&resolver, &args, json).await
            }
            Command::Lifecycle(args) => {
                let config = controller_config()?;
                let source = membership_source(registry_file, discovery_uri, &config)?;
                let resolver = MembershipResolver::new(source);
                let transport = ReqwestTransport::new(config.http_timeout())?;
                commands::lifecycle::run(
                    &resolver,
                    &transport,
                    &args,
                    config.lifecycle_timeout(),
                    json,
                )
                .await
            }
        }
    }
}

/// Load controller settings from `FLEET_*` environment variables.
///
/// # Errors
///
/// Returns an error if a variable is set but cannot be parsed.
pub fn controller_config() -> Result<ControllerConfig> {
    controller_config_from(std::env::vars())
}

/// Same as [`controller_config`], reading from the given pairs.
///
/// # Errors
///
/// Returns an error if a prefixed variable holds a value of the wrong type.
pub fn controller_config_from<I>(vars: I) -> Result<ControllerConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed("FLEET_")
        .from_iter(vars)
        .context("failed to load config from FLEET_* env vars")
}

/// Pick the membership source from the command line.
///
/// # Errors
///
/// Returns an error if neither source is given or the discovery client
/// cannot be built.
pub fn membership_source(
    registry_file: Option<PathBuf>,
    discovery_uri: Option<Url>,
    config: &ControllerConfig,
) -> Result<ConfiguredSource> {
    match (registry_file, discovery_uri) {
        (Some(path), _) => Ok(ConfiguredSource::File(StaticRegistry::new(path))),
        (None, Some(uri)) => Ok(ConfiguredSource::Discovery(DiscoveryClient::new(
            uri,
            config.service_type.clone(),
            config.http_timeout(),
        )?)),
        (None, None) => bail!(
            "no agent registry configured; pass --registry-file or --discovery-uri \
             (or set FLEET_REGISTRY_FILE / FLEET_DISCOVERY_URI)"
        ),
    }
}
