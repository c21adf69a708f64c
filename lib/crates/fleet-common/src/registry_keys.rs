/// Property keys agents publish in their registry record.
pub mod keys {
    /// Base URI of the agent's HTTP endpoint.
    /// Value: absolute URI, e.g. `http://10.0.0.5:8080`
    pub const ADDRESS: &str = "http";

    /// Whether the agent's local service is configured as the coordinator.
    /// Value: `"true"` (any case) for coordinator, anything else for worker
    pub const COORDINATOR: &str = "configured-presto-coordinator";

    /// Service type agents announce themselves under in service discovery.
    pub const DEFAULT_SERVICE_TYPE: &str = "presto-manager";
}

/// Interpret the raw coordinator flag of a registry record.
///
/// Only the text `true`, ignoring ASCII case, selects the coordinator role;
/// absence or any other text means worker.
#[must_use]
pub fn parse_coordinator_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}
