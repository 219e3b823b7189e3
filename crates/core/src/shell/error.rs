use crate::client::ClientError;
use crate::services::Capability;
use pd_protocol::error_models::ServiceError;
use thiserror::Error;

/// Errors raised by the application shell.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("The registered service stub does not provide {0}")]
    MissingCapability(Capability),

    #[error("No user is logged in")]
    NotLoggedIn,

    #[error("A user is already logged in")]
    AlreadyLoggedIn,

    #[error("No process is running")]
    NoActiveProcess,

    #[error("Panel '{panel}' has no parent to handle {operation}")]
    Unhandled {
        panel: String,
        operation: &'static str,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub type ShellResult<T> = Result<T, ShellError>;
