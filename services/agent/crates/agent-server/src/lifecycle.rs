//! Mapping from lifecycle actions to the OS commands that perform them.

use fleet_common::{AgentServerConfig, LifecycleAction, LifecycleParams};

use crate::error::ActionError;
use crate::runner::TimeoutClass;

/// A concrete command line and the deadline it runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    pub argv: Vec<String>,
    pub class: TimeoutClass,
}

/// Programs used to control the local service instance.
#[derive(Debug, Clone)]
pub struct LifecycleTable {
    service_control: String,
    service_name: String,
    package_manager: String,
}

impl LifecycleTable {
    #[must_use]
    pub fn new(
        service_control: impl Into<String>,
        service_name: impl Into<String>,
        package_manager: impl Into<String>,
    ) -> Self {
        Self {
            service_control: service_control.into(),
            service_name: service_name.into(),
            package_manager: package_manager.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AgentServerConfig) -> Self {
        Self::new(
            &config.service_control,
            &config.service_name,
            &config.package_manager,
        )
    }

    /// Build the command for `action`.
    ///
    /// Service control verbs run on the short deadline; package operations
    /// run on the long one. `install` requires `params.package`; `uninstall`
    /// falls back to the service name.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::MissingPackage`] for `install` without a package.
    pub fn plan(
        &self,
        action: LifecycleAction,
        params: &LifecycleParams,
    ) -> Result<PlannedCommand, ActionError> {
        let planned = match action {
            LifecycleAction::Install => {
                let package = params
                    .package
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or(ActionError::MissingPackage(action))?;
                PlannedCommand {
                    argv: vec![self.package_manager.clone(), "-i".to_string(), package.to_string()],
                    class: TimeoutClass::Long,
                }
            }
            LifecycleAction::Uninstall => {
                let package = params.package.as_deref().unwrap_or(&self.service_name);
                PlannedCommand {
                    argv: vec![self.package_manager.clone(), "-e".to_string(), package.to_string()],
                    class: TimeoutClass::Long,
                }
            }
            LifecycleAction::Start
            | LifecycleAction::Stop
            | LifecycleAction::Restart
            | LifecycleAction::Status => PlannedCommand {
                argv: vec![
                    self.service_control.clone(),
                    self.service_name.clone(),
                    action.as_str().to_string(),
                ],
                class: TimeoutClass::Short,
            },
        };
        Ok(planned)
    }
}
