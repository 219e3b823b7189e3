//! Service capability traits.
//!
//! A remote service stub may implement any subset of the capabilities below.
//! [`ServiceStub`] is the registration trait: each accessor reports whether
//! the stub provides a capability and defaults to `None`.

use async_trait::async_trait;
use pd_protocol::error_models::ServiceResult;
use pd_protocol::ipc::ExecuteRequest;
use pd_protocol::process_models::ProcessState;
use pd_protocol::session_models::{Credentials, UserData};
use std::fmt;
use std::sync::Arc;

/// Executes the `EXECUTE_PROCESS` command.
#[async_trait]
pub trait CommandService: Send + Sync {
    async fn execute(&self, request: ExecuteRequest) -> ServiceResult<ProcessState>;
}

/// Authenticates users.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: Credentials) -> ServiceResult<UserData>;
    async fn logout(&self, user_id: &str) -> ServiceResult<()>;
}

/// Simple server-side key/value storage.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>>;
    async fn put(&self, key: &str, value: String) -> ServiceResult<()>;
}

/// A capability the application may request from the registered stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CommandExecution,
    Authentication,
    Storage,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::CommandExecution => "command execution",
            Capability::Authentication => "authentication",
            Capability::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// A stub object that can be registered with the service handle.
///
/// Implementors override the accessor of every capability they satisfy,
/// usually by returning `Some(self)`.
pub trait ServiceStub: Send + Sync {
    fn command_service(self: Arc<Self>) -> Option<Arc<dyn CommandService>> {
        None
    }

    fn auth_service(self: Arc<Self>) -> Option<Arc<dyn AuthService>> {
        None
    }

    fn storage_service(self: Arc<Self>) -> Option<Arc<dyn StorageService>> {
        None
    }
}
