//! Agent configuration from `FLEET_AGENT_*` environment variables.

use fleet_common::AgentServerConfig;

pub const ENV_PREFIX: &str = "FLEET_AGENT_";

/// Build the agent config from `(name, value)` pairs, normally
/// `std::env::vars()`. Unset fields take their defaults.
///
/// # Errors
///
/// Returns an error if a prefixed variable holds a value of the wrong type.
pub fn load<I>(vars: I) -> Result<AgentServerConfig, envy::Error>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed(ENV_PREFIX).from_iter(vars)
}
