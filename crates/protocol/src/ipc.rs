//! Remote command protocol and client lifecycle events.
//!
//! The protocol follows a Command/Event pattern:
//! - `Command`: requests sent from a process client to the application server
//! - `Event`: lifecycle notifications sent from a process client to the shell
//!
//! Only one command exists, `EXECUTE_PROCESS`, which either starts a new
//! process from a [`ProcessDescriptor`] or continues a running one from its
//! latest [`ProcessState`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::process_models::{ExecutionMode, ProcessDescriptor, ProcessState};

/// Commands understood by the application server.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "command": "EXECUTE_PROCESS",
///   "payload": { "type": "start", "descriptor": { "name": "Checkout", "locale": "en-US" } }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "command", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    ExecuteProcess(ExecuteRequest),
}

/// Payload of the `EXECUTE_PROCESS` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecuteRequest {
    /// Start a new process.
    Start { descriptor: ProcessDescriptor },

    /// Continue a running process from its latest snapshot.
    Continue {
        state: ProcessState,
        mode: ExecutionMode,
        /// UI event that triggered the request, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<InteractionEvent>,
    },
}

impl ExecuteRequest {
    /// Execution mode of the request. Starting a process always executes.
    pub fn mode(&self) -> ExecutionMode {
        match self {
            Self::Start { .. } => ExecutionMode::Execute,
            Self::Continue { mode, .. } => *mode,
        }
    }

    /// Name of the process the request addresses.
    pub fn process_name(&self) -> &str {
        match self {
            Self::Start { descriptor } => &descriptor.name,
            Self::Continue { state, .. } => &state.process_name,
        }
    }
}

impl From<ExecuteRequest> for Command {
    fn from(request: ExecuteRequest) -> Self {
        Command::ExecuteProcess(request)
    }
}

/// Kind of UI event that produced an interaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub enum InteractionEventKind {
    /// A button or similar action widget was used.
    Action,
    /// A field value changed.
    FieldChanged,
    /// An entry in a list or table was selected.
    Selection,
}

/// UI event accompanying an interaction request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct InteractionEvent {
    pub kind: InteractionEventKind,
    /// Name of the widget or field that raised the event.
    pub source: String,
}

impl InteractionEvent {
    pub fn new(kind: InteractionEventKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

/// Lifecycle events sent from a process client to its shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A client sent its first request.
    ProcessStarted {
        #[ts(type = "string")]
        client_id: Uuid,
        process_name: String,
    },

    /// A new interaction snapshot was rendered.
    ProcessUpdated {
        #[ts(type = "string")]
        client_id: Uuid,
        state: ProcessState,
    },

    /// The process reported `finished`.
    ProcessFinished {
        #[ts(type = "string")]
        client_id: Uuid,
        #[ts(type = "string | null")]
        parent: Option<Uuid>,
        state: ProcessState,
    },

    /// The process was terminated by an unrecoverable error.
    ProcessFailed {
        #[ts(type = "string")]
        client_id: Uuid,
        #[ts(type = "string | null")]
        parent: Option<Uuid>,
        error: String,
    },
}

impl Event {
    pub fn client_id(&self) -> Uuid {
        match self {
            Event::ProcessStarted { client_id, .. }
            | Event::ProcessUpdated { client_id, .. }
            | Event::ProcessFinished { client_id, .. }
            | Event::ProcessFailed { client_id, .. } => *client_id,
        }
    }
}
