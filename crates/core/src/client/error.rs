//! Error types for the process execution client.

use crate::client::phase::ClientPhase;
use thiserror::Error;
use uuid::Uuid;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`ProcessExecutionClient`](crate::client::ProcessExecutionClient)
/// operations.
///
/// Service failures are never reported here; they are handled by
/// `on_error` and end in a re-render or a terminal summary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The operation is not valid in the current phase.
    #[error("Cannot {operation} while the client is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: ClientPhase,
    },

    /// The process finished or failed; no further requests are accepted.
    #[error("The process is {0} and accepts no further requests")]
    Closed(ClientPhase),

    /// The current step has no parameter with this name.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A response was routed to a client that does not exist (any more).
    #[error("Unknown client: {0}")]
    UnknownClient(Uuid),

    /// The dispatch channel was closed by its receiver.
    #[error("Dispatch channel closed")]
    ChannelClosed,
}
