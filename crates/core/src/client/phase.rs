//! Client phases and operation outcomes.

use std::fmt;

/// Lifecycle phase of a process execution client.
///
/// ```text
/// Idle -> Running -> (Interacting <-> Running) -> Finished
///                                              \-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Nothing has been sent yet.
    Idle,
    /// A request is in flight and no interaction is shown.
    Running,
    /// An interaction step is shown and waits for the user.
    Interacting,
    /// The process reported `finished`.
    Finished,
    /// An unrecoverable error terminated the process.
    Failed,
}

impl ClientPhase {
    /// Returns `true` for phases that accept no further requests.
    pub fn is_terminal(self) -> bool {
        matches!(self, ClientPhase::Finished | ClientPhase::Failed)
    }
}

impl fmt::Display for ClientPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientPhase::Idle => "idle",
            ClientPhase::Running => "running",
            ClientPhase::Interacting => "interacting",
            ClientPhase::Finished => "finished",
            ClientPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why an operation was accepted without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A request is already in flight.
    Locked,
    /// The step needs input the user has not provided yet.
    AwaitingInput,
    /// A confirmation dialog is open.
    AwaitingConfirmation,
    RollbackUnavailable,
    /// A cancel was already sent or deferred.
    AlreadyCancelling,
    /// There is no paused auto-continue to resume.
    NothingToResume,
}

/// Result of a user-level client operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A request was dispatched.
    Sent,
    /// A cancel was recorded and will be sent after the pending response.
    Deferred,
    /// A confirmation dialog was opened.
    AwaitingConfirmation,
    /// A field edit was recorded locally.
    Recorded,
    Ignored(IgnoreReason),
}

/// Actions currently offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionSet {
    pub next: bool,
    pub previous: bool,
    pub cancel: bool,
    pub reload: bool,
}
