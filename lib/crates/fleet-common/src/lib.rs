pub mod config;
pub mod registry_keys;
pub mod types;

pub use config::{AgentServerConfig, ControllerConfig};
pub use registry_keys::{keys, parse_coordinator_flag};
pub use types::*;
