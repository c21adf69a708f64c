use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use crate::registry_keys::keys;

/// Agent server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentServerConfig {
    /// Listen address (default: 0.0.0.0:8080)
    #[serde(default = "default_agent_addr")]
    pub listen_addr: SocketAddr,

    /// Deadline in seconds for short commands (service start/stop/status)
    #[serde(default = "default_short_timeout_secs")]
    pub short_timeout_secs: u64,

    /// Deadline in seconds for long commands (package install/uninstall)
    #[serde(default = "default_long_timeout_secs")]
    pub long_timeout_secs: u64,

    /// Name of the managed service as known to the service control program
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Program that starts/stops services, invoked as `<control> <name> <verb>`
    #[serde(default = "default_service_control")]
    pub service_control: String,

    /// Package manager used for install/uninstall
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
}

impl AgentServerConfig {
    #[must_use]
    pub fn short_timeout(&self) -> Duration {
        Duration::from_secs(self.short_timeout_secs)
    }

    #[must_use]
    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.long_timeout_secs)
    }
}

/// Controller configuration that does not come from command-line flags
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Service type queried in service discovery
    #[serde(default = "default_service_type")]
    pub service_type: String,

    /// Timeout in seconds for registry queries and other short HTTP requests
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Timeout in seconds for a lifecycle request; must outlast the agent's
    /// long command deadline so the agent always reports the outcome
    #[serde(default = "default_lifecycle_timeout_secs")]
    pub lifecycle_timeout_secs: u64,
}

impl ControllerConfig {
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn lifecycle_timeout(&self) -> Duration {
        Duration::from_secs(self.lifecycle_timeout_secs)
    }
}

fn default_agent_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_short_timeout_secs() -> u64 {
    30
}

fn default_long_timeout_secs() -> u64 {
    1200
}

fn default_service_name() -> String {
    "presto".to_string()
}

fn default_service_control() -> String {
    "service".to_string()
}

fn default_package_manager() -> String {
    "rpm".to_string()
}

fn default_service_type() -> String {
    keys::DEFAULT_SERVICE_TYPE.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_lifecycle_timeout_secs() -> u64 {
    default_long_timeout_secs() + 60
}

impl Default for AgentServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_agent_addr(),
            short_timeout_secs: default_short_timeout_secs(),
            long_timeout_secs: default_long_timeout_secs(),
            service_name: default_service_name(),
            service_control: default_service_control(),
            package_manager: default_package_manager(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            service_type: default_service_type(),
            http_timeout_secs: default_http_timeout_secs(),
            lifecycle_timeout_secs: default_lifecycle_timeout_secs(),
        }
    }
}
