//! Capability lookup over a single registered service stub.

use crate::services::base::{AuthService, Capability, CommandService, ServiceStub, StorageService};
use std::sync::Arc;
use tracing::{info, warn};

/// Resolves typed service stubs by capability.
///
/// One stub is registered at application start. Its capabilities are
/// resolved once, at registration; accessors afterwards only clone the
/// resolved handles. A capability the stub does not provide yields `None`.
#[derive(Clone, Default)]
pub struct RemoteServiceHandle {
    command: Option<Arc<dyn CommandService>>,
    auth: Option<Arc<dyn AuthService>>,
    storage: Option<Arc<dyn StorageService>>,
}

impl RemoteServiceHandle {
    /// Register `stub` and resolve the capabilities it satisfies.
    pub fn register(stub: Arc<dyn ServiceStub>) -> Self {
        let handle = Self {
            command: Arc::clone(&stub).command_service(),
            auth: Arc::clone(&stub).auth_service(),
            storage: stub.storage_service(),
        };

        let provided = handle.capabilities();
        if provided.is_empty() {
            warn!("registered service stub provides no capabilities");
        } else {
            let names: Vec<String> = provided.iter().map(ToString::to_string).collect();
            info!(capabilities = %names.join(", "), "service stub registered");
        }

        handle
    }

    pub fn command_service(&self) -> Option<Arc<dyn CommandService>> {
        self.command.clone()
    }

    pub fn auth_service(&self) -> Option<Arc<dyn AuthService>> {
        self.auth.clone()
    }

    pub fn storage_service(&self) -> Option<Arc<dyn StorageService>> {
        self.storage.clone()
    }

    pub fn provides(&self, capability: Capability) -> bool {
        match capability {
            Capability::CommandExecution => self.command.is_some(),
            Capability::Authentication => self.auth.is_some(),
            Capability::Storage => self.storage.is_some(),
        }
    }

    /// All capabilities provided by the registered stub.
    pub fn capabilities(&self) -> Vec<Capability> {
        [
            Capability::CommandExecution,
            Capability::Authentication,
            Capability::Storage,
        ]
        .into_iter()
        .filter(|c| self.provides(*c))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pd_protocol::error_models::{ServiceError, ServiceResult};
    use pd_protocol::ipc::ExecuteRequest;
    use pd_protocol::process_models::ProcessState;

    /// Stub that only executes commands.
    struct CommandOnly;

    #[async_trait]
    impl CommandService for CommandOnly {
        async fn execute(&self, request: ExecuteRequest) -> ServiceResult<ProcessState> {
            Err(ServiceError::unrecoverable(format!(
                "no server for {}",
                request.process_name()
            )))
        }
    }

    impl ServiceStub for CommandOnly {
        fn command_service(self: Arc<Self>) -> Option<Arc<dyn CommandService>> {
            Some(self)
        }
    }

    struct Nothing;

    impl ServiceStub for Nothing {}

    #[test]
    fn test_register_resolves_only_provided_capabilities() {
        let handle = RemoteServiceHandle::register(Arc::new(CommandOnly));

        assert!(handle.command_service().is_some());
        assert!(handle.auth_service().is_none());
        assert!(handle.storage_service().is_none());
        assert_eq!(handle.capabilities(), vec![Capability::CommandExecution]);
    }

    #[test]
    fn test_missing_capabilities_are_not_errors() {
        let handle = RemoteServiceHandle::register(Arc::new(Nothing));
        assert!(handle.capabilities().is_empty());
        assert!(!handle.provides(Capability::Storage));
    }

    #[test]
    fn test_default_handle_is_empty() {
        let handle = RemoteServiceHandle::default();
        assert!(handle.command_service().is_none());
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::CommandExecution.to_string(), "command execution");
        assert_eq!(Capability::Authentication.to_string(), "authentication");
    }
}
