//! Process execution client state machine.
//!
//! A `ProcessExecutionClient` drives one running server-side process. It is
//! event driven: operations emit [`Dispatch`] values on the dispatch channel,
//! and whoever executes them feeds the outcome back through
//! [`ProcessExecutionClient::on_state_received`] or
//! [`ProcessExecutionClient::on_error`] (or [`ProcessExecutionClient::route`]
//! for trees with child processes).
//!
//! At most one request per client is in flight. The `locked` flag is set
//! when a request is dispatched and cleared when its response arrives;
//! while it is set, user operations are ignored and a cancel is deferred.

use crate::client::error::{ClientError, ClientResult};
use crate::client::phase::{ActionOutcome, ActionSet, ClientPhase, IgnoreReason};
use crate::ui::{Confirmation, ProcessView, Summary};
use pd_protocol::error_models::{ServiceError, ServiceResult};
use pd_protocol::ipc::{Event, ExecuteRequest, InteractionEvent};
use pd_protocol::process_models::{
    ExecutionMode, InteractionParameter, ProcessDescriptor, ProcessState,
};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Identifies a client within a shell.
pub type ClientId = Uuid;

/// A request waiting to be executed by the command service.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub client_id: ClientId,
    pub request: ExecuteRequest,
}

/// Outbound channels shared by all clients of one shell.
#[derive(Debug, Clone)]
pub struct ClientChannels {
    pub dispatch_tx: UnboundedSender<Dispatch>,
    pub events_tx: UnboundedSender<Event>,
}

/// Step, style and field layout of the last full render.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RenderKey {
    step: String,
    style: Option<String>,
    fields: Vec<String>,
}

impl RenderKey {
    fn of(state: &ProcessState) -> Self {
        Self {
            step: state.step.clone(),
            style: state.style().map(str::to_string),
            fields: state.parameters.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

/// Drives one running process instance.
pub struct ProcessExecutionClient {
    id: ClientId,
    parent: Option<ClientId>,
    phase: ClientPhase,
    current: Option<ProcessState>,
    rendered: Option<RenderKey>,
    locked: bool,
    /// The start request is in flight and its response not yet handled.
    awaiting_start: bool,
    pending_cancel: bool,
    cancel_sent: bool,
    cancelled: bool,
    awaiting_confirmation: bool,
    auto_continue_paused: bool,
    /// Auto-continue was paused only because a confirmation dialog opened.
    paused_by_confirmation: bool,
    children: Vec<ProcessExecutionClient>,
    view: Box<dyn ProcessView>,
    channels: ClientChannels,
}

impl ProcessExecutionClient {
    pub fn new(view: Box<dyn ProcessView>, channels: ClientChannels) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: None,
            phase: ClientPhase::Idle,
            current: None,
            rendered: None,
            locked: false,
            awaiting_start: false,
            pending_cancel: false,
            cancel_sent: false,
            cancelled: false,
            awaiting_confirmation: false,
            auto_continue_paused: false,
            paused_by_confirmation: false,
            children: Vec::new(),
            view,
            channels,
        }
    }

    /// Enable or disable automatic continuation of auto-continue steps.
    pub fn with_auto_continue(mut self, enabled: bool) -> Self {
        self.auto_continue_paused = !enabled;
        self
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn parent(&self) -> Option<ClientId> {
        self.parent
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    /// Latest snapshot received from the server.
    pub fn current_state(&self) -> Option<&ProcessState> {
        self.current.as_ref()
    }

    /// Returns `true` while a request is in flight.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns `true` while a cancel waits for the pending response.
    pub fn is_cancel_pending(&self) -> bool {
        self.pending_cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    pub fn is_auto_continue_paused(&self) -> bool {
        self.auto_continue_paused
    }

    /// Running child processes.
    pub fn children(&self) -> &[ProcessExecutionClient] {
        &self.children
    }

    /// Returns `true` if `id` is this client or one of its descendants.
    pub fn contains(&self, id: ClientId) -> bool {
        self.id == id || self.children.iter().any(|c| c.contains(id))
    }

    /// This client or the descendant with the given id.
    pub fn find_mut(&mut self, id: ClientId) -> Option<&mut ProcessExecutionClient> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Start the process described by `descriptor`.
    pub fn start(&mut self, descriptor: ProcessDescriptor) -> ClientResult<ActionOutcome> {
        if self.phase != ClientPhase::Idle {
            return Err(ClientError::InvalidPhase {
                operation: "start",
                phase: self.phase,
            });
        }

        info!(client = %self.id, process = %descriptor.name, "starting process");
        self.phase = ClientPhase::Running;
        self.emit(Event::ProcessStarted {
            client_id: self.id,
            process_name: descriptor.name.clone(),
        });
        let outcome = self.send(ExecuteRequest::Start { descriptor })?;
        self.awaiting_start = true;
        Ok(outcome)
    }

    /// Take over a process the server already started, e.g. a spawned child.
    pub fn attach(&mut self, state: ProcessState) -> ClientResult<()> {
        if self.phase != ClientPhase::Idle {
            return Err(ClientError::InvalidPhase {
                operation: "attach",
                phase: self.phase,
            });
        }

        self.phase = ClientPhase::Running;
        self.emit(Event::ProcessStarted {
            client_id: self.id,
            process_name: state.process_name.clone(),
        });
        self.on_state_received(state)
    }

    /// Record a UI edit of `name` on the current snapshot.
    pub fn record_edit(&mut self, name: &str, value: Value) -> ClientResult<ActionOutcome> {
        self.ensure_open()?;
        if self.locked {
            return Ok(ActionOutcome::Ignored(IgnoreReason::Locked));
        }
        self.ensure_interacting("edit a parameter")?;

        let Some(parameter) = self.current.as_mut().and_then(|s| s.parameter_mut(name)) else {
            return Err(ClientError::UnknownParameter(name.to_string()));
        };
        parameter.value = value;
        parameter.modified = true;
        Ok(ActionOutcome::Recorded)
    }

    /// Fold `changed` into a new request and execute it.
    ///
    /// A no-op while a request is in flight.
    pub fn submit_interaction(
        &mut self,
        changed: Vec<InteractionParameter>,
        event: InteractionEvent,
    ) -> ClientResult<ActionOutcome> {
        self.ensure_open()?;
        if self.locked {
            debug!(client = %self.id, "interaction ignored while locked");
            return Ok(ActionOutcome::Ignored(IgnoreReason::Locked));
        }
        self.ensure_interacting("submit an interaction")?;
        if self.awaiting_confirmation {
            return Ok(ActionOutcome::Ignored(IgnoreReason::AwaitingConfirmation));
        }

        if let Some(current) = &self.current {
            if let Some(unknown) = changed.iter().find(|p| current.parameter(&p.name).is_none()) {
                return Err(ClientError::UnknownParameter(unknown.name.clone()));
            }
        }
        for parameter in changed {
            self.record_edit(&parameter.name, parameter.value)?;
        }

        self.continue_with(ExecutionMode::Execute, Some(event))
    }

    /// Request the next step.
    pub fn advance(&mut self) -> ClientResult<ActionOutcome> {
        if let Some(ignored) = self.check_user_action("advance")? {
            return Ok(ignored);
        }
        if !self.next_offered() {
            return Ok(ActionOutcome::Ignored(IgnoreReason::AwaitingInput));
        }
        self.continue_with(ExecutionMode::Execute, None)
    }

    /// Return to the previous step.
    pub fn rollback(&mut self) -> ClientResult<ActionOutcome> {
        if let Some(ignored) = self.check_user_action("roll back")? {
            return Ok(ignored);
        }
        if !self.rollback_offered() {
            return Ok(ActionOutcome::Ignored(IgnoreReason::RollbackUnavailable));
        }
        self.continue_with(ExecutionMode::Rollback, None)
    }

    /// Re-request the current step.
    pub fn reload(&mut self) -> ClientResult<ActionOutcome> {
        if let Some(ignored) = self.check_user_action("reload")? {
            return Ok(ignored);
        }
        self.continue_with(ExecutionMode::Reload, None)
    }

    /// Cancel the process.
    ///
    /// Asks for confirmation unless the step reports an immediate
    /// interaction. While a request is in flight the cancel is deferred
    /// until its response arrives.
    pub fn cancel(&mut self) -> ClientResult<ActionOutcome> {
        self.ensure_open()?;
        if self.pending_cancel || self.cancel_sent {
            return Ok(ActionOutcome::Ignored(IgnoreReason::AlreadyCancelling));
        }
        if self.phase == ClientPhase::Idle {
            return Err(ClientError::InvalidPhase {
                operation: "cancel",
                phase: self.phase,
            });
        }
        if self.locked {
            info!(client = %self.id, "cancel deferred until the pending response arrives");
            self.pending_cancel = true;
            return Ok(ActionOutcome::Deferred);
        }
        if self.awaiting_confirmation {
            return Ok(ActionOutcome::Ignored(IgnoreReason::AwaitingConfirmation));
        }

        let Some(state) = &self.current else {
            return Err(ClientError::InvalidPhase {
                operation: "cancel",
                phase: self.phase,
            });
        };
        if state.has_immediate_interaction {
            return self.continue_with(ExecutionMode::Cancel, None);
        }

        let confirmation = Confirmation::CancelProcess {
            process_name: state.process_name.clone(),
        };
        self.awaiting_confirmation = true;
        self.paused_by_confirmation = !self.auto_continue_paused;
        self.auto_continue_paused = true;
        self.view.ask_confirmation(&confirmation);
        Ok(ActionOutcome::AwaitingConfirmation)
    }

    /// Result callback of the cancel confirmation dialog.
    pub fn on_confirmation(&mut self, accepted: bool) -> ClientResult<ActionOutcome> {
        if !self.awaiting_confirmation {
            return Err(ClientError::InvalidPhase {
                operation: "answer a confirmation",
                phase: self.phase,
            });
        }
        self.awaiting_confirmation = false;
        let resume = std::mem::take(&mut self.paused_by_confirmation);
        self.ensure_open()?;

        if accepted {
            if self.locked {
                self.pending_cancel = true;
                return Ok(ActionOutcome::Deferred);
            }
            return self.continue_with(ExecutionMode::Cancel, None);
        }

        if resume {
            self.resume_auto_continue()
        } else {
            Ok(ActionOutcome::Ignored(IgnoreReason::NothingToResume))
        }
    }

    pub fn pause_auto_continue(&mut self) {
        self.auto_continue_paused = true;
    }

    /// Resume auto-continuation; continues immediately if the current step
    /// is an auto-continue step.
    ///
    /// A pending cancel takes precedence over resuming.
    pub fn resume_auto_continue(&mut self) -> ClientResult<ActionOutcome> {
        self.auto_continue_paused = false;
        let idle_auto_step = self.phase == ClientPhase::Interacting
            && !self.locked
            && !self.pending_cancel
            && !self.awaiting_confirmation
            && self.current.as_ref().is_some_and(|s| s.auto_continue);
        if !idle_auto_step {
            return Ok(ActionOutcome::Ignored(IgnoreReason::NothingToResume));
        }
        self.continue_with(ExecutionMode::Execute, None)
    }

    /// Actions currently offered to the user.
    pub fn available_actions(&self) -> ActionSet {
        if self.phase.is_terminal() || self.phase == ClientPhase::Idle {
            return ActionSet::default();
        }

        let cancel = !self.pending_cancel && !self.cancel_sent && !self.awaiting_confirmation;
        if self.phase != ClientPhase::Interacting || self.locked || self.awaiting_confirmation {
            return ActionSet {
                cancel,
                ..ActionSet::default()
            };
        }

        ActionSet {
            next: self.next_offered(),
            previous: self.rollback_offered(),
            cancel,
            reload: true,
        }
    }

    /// Route the outcome of a dispatched request to the client it belongs to.
    ///
    /// Children that reach a terminal phase are dropped afterwards.
    pub fn route(
        &mut self,
        client_id: ClientId,
        result: ServiceResult<ProcessState>,
    ) -> ClientResult<()> {
        if client_id == self.id {
            return match result {
                Ok(state) => self.on_state_received(state),
                Err(error) => self.on_error(error),
            };
        }

        let Some(index) = self.children.iter().position(|c| c.contains(client_id)) else {
            return Err(ClientError::UnknownClient(client_id));
        };
        let outcome = self.children[index].route(client_id, result);
        if self.children[index].phase().is_terminal() {
            let child = self.children.remove(index);
            debug!(parent = %self.id, child = %child.id(), "child process closed");
        }
        outcome
    }

    /// Handle a snapshot returned by the server.
    pub fn on_state_received(&mut self, new_state: ProcessState) -> ClientResult<()> {
        if self.phase.is_terminal() {
            warn!(client = %self.id, "ignoring snapshot for a closed process");
            return Ok(());
        }
        self.locked = false;
        let start_response = std::mem::take(&mut self.awaiting_start);

        if self.pending_cancel && !new_state.finished {
            self.pending_cancel = false;
            self.current = Some(new_state);
            info!(client = %self.id, "sending deferred cancel");
            return self.continue_with(ExecutionMode::Cancel, None).map(|_| ());
        }
        self.pending_cancel = false;
        self.view.set_busy(false);

        let previous_final = self.current.as_ref().is_some_and(|s| s.final_step);
        self.spawn_children(&new_state)?;

        if new_state.finished {
            self.finish(new_state, previous_final);
            return Ok(());
        }
        if start_response && !has_outstanding_work(&new_state) {
            info!(client = %self.id, step = %new_state.step, "start returned nothing to interact with");
            let mut state = new_state;
            state.finished = true;
            self.finish(state, previous_final);
            return Ok(());
        }

        self.phase = ClientPhase::Interacting;
        if new_state.auto_continue && !self.auto_continue_paused {
            debug!(client = %self.id, step = %new_state.step, "auto-continuing");
            self.current = Some(new_state);
            return self.continue_with(ExecutionMode::Execute, None).map(|_| ());
        }

        self.render(new_state);
        self.emit_updated();
        Ok(())
    }

    /// Handle a failed request.
    pub fn on_error(&mut self, error: ServiceError) -> ClientResult<()> {
        if self.phase.is_terminal() {
            warn!(client = %self.id, %error, "ignoring error for a closed process");
            return Ok(());
        }
        self.locked = false;
        self.awaiting_start = false;

        match error {
            ServiceError::Unrecoverable { message, cause } => {
                error!(client = %self.id, %message, cause = ?cause, "process failed");
                self.pending_cancel = false;
                self.cancelled = true;
                self.phase = ClientPhase::Failed;
                self.view.set_busy(false);

                let process_name = self
                    .current
                    .as_ref()
                    .map(|s| s.process_name.clone())
                    .unwrap_or_default();
                self.view.show_summary(&Summary::Failed {
                    process_name,
                    message: message.clone(),
                });
                self.emit(Event::ProcessFailed {
                    client_id: self.id,
                    parent: self.parent,
                    error: message,
                });
                Ok(())
            }
            ServiceError::Recoverable {
                message,
                field_errors,
                replacement,
            } => {
                self.cancel_sent = false;
                if self.pending_cancel {
                    self.pending_cancel = false;
                    if let Some(state) = replacement {
                        self.current = Some(*state);
                    }
                    if self.current.is_some() {
                        return self.continue_with(ExecutionMode::Cancel, None).map(|_| ());
                    }
                    // Nothing to cancel yet; fall back to a normal recovery.
                    self.phase = ClientPhase::Idle;
                    self.view.set_busy(false);
                    self.view.show_message(&message);
                    return Ok(());
                }

                warn!(client = %self.id, %message, fields = field_errors.len(), "recoverable service error");
                self.view.set_busy(false);

                match replacement {
                    Some(state) if state.finished => {
                        let previous_final = self.current.as_ref().is_some_and(|s| s.final_step);
                        self.finish(*state, previous_final);
                    }
                    Some(state) => {
                        self.phase = ClientPhase::Interacting;
                        self.render(*state);
                        self.view.show_message(&message);
                        self.emit_updated();
                    }
                    None if self.current.is_none() => {
                        // The start request itself was rejected.
                        self.phase = ClientPhase::Idle;
                        self.view.show_message(&message);
                    }
                    None => {
                        self.phase = ClientPhase::Interacting;
                        if field_errors.is_empty() {
                            self.view.show_message(&message);
                        }
                        for (field, text) in &field_errors {
                            if !self.view.show_field_error(field, text) {
                                self.view.show_message(&format!("{field}: {text}"));
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn finish(&mut self, state: ProcessState, previous_final: bool) {
        self.phase = ClientPhase::Finished;
        self.cancelled = state.cancelled;
        if !previous_final {
            self.view.show_summary(&Summary::completed(&state));
        }
        info!(
            client = %self.id,
            process = %state.process_name,
            cancelled = state.cancelled,
            "process finished"
        );
        self.emit(Event::ProcessFinished {
            client_id: self.id,
            parent: self.parent,
            state: state.clone(),
        });
        self.current = Some(state);
    }

    fn spawn_children(&mut self, state: &ProcessState) -> ClientResult<()> {
        for child_state in &state.children {
            let view = self.view.child_view(child_state);
            let mut child = ProcessExecutionClient::new(view, self.channels.clone());
            child.parent = Some(self.id);
            child.auto_continue_paused = self.auto_continue_paused && !self.paused_by_confirmation;
            child.attach(child_state.clone())?;
            if !child.phase().is_terminal() {
                self.children.push(child);
            }
        }
        Ok(())
    }

    /// Update the panel in place when step, style and field set are
    /// unchanged; rebuild it otherwise or when a field cannot be located.
    fn render(&mut self, state: ProcessState) {
        let key = RenderKey::of(&state);
        let same_layout = self.rendered.as_ref() == Some(&key);
        let view = &mut self.view;
        let updated = same_layout && state.parameters.iter().all(|p| view.update_field(p));

        if updated {
            debug!(client = %self.id, step = %state.step, "updated fields in place");
        } else {
            self.view.render(&state);
        }
        self.rendered = Some(key);
        self.current = Some(state);
    }

    fn continue_with(
        &mut self,
        mode: ExecutionMode,
        event: Option<InteractionEvent>,
    ) -> ClientResult<ActionOutcome> {
        let Some(current) = self.current.as_mut() else {
            return Err(ClientError::InvalidPhase {
                operation: "continue",
                phase: self.phase,
            });
        };

        let mut state = current.clone();
        state.children.clear();
        current.clear_modified();

        if mode == ExecutionMode::Cancel {
            self.cancel_sent = true;
        }
        self.send(ExecuteRequest::Continue { state, mode, event })
    }

    fn send(&mut self, request: ExecuteRequest) -> ClientResult<ActionOutcome> {
        debug!(
            client = %self.id,
            mode = ?request.mode(),
            process = %request.process_name(),
            "dispatching request"
        );
        self.channels
            .dispatch_tx
            .send(Dispatch {
                client_id: self.id,
                request,
            })
            .map_err(|_| ClientError::ChannelClosed)?;

        self.locked = true;
        if self.phase == ClientPhase::Interacting {
            self.phase = ClientPhase::Running;
        }
        self.view.set_busy(true);
        Ok(ActionOutcome::Sent)
    }

    fn emit(&self, event: Event) {
        if self.channels.events_tx.send(event).is_err() {
            debug!(client = %self.id, "event receiver dropped");
        }
    }

    fn emit_updated(&self) {
        if let Some(state) = &self.current {
            self.emit(Event::ProcessUpdated {
                client_id: self.id,
                state: state.clone(),
            });
        }
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.phase.is_terminal() {
            return Err(ClientError::Closed(self.phase));
        }
        Ok(())
    }

    fn ensure_interacting(&self, operation: &'static str) -> ClientResult<()> {
        if self.phase != ClientPhase::Interacting {
            return Err(ClientError::InvalidPhase {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Shared guard of the navigation operations. Returns the outcome to
    /// report when the operation must be ignored.
    fn check_user_action(&self, operation: &'static str) -> ClientResult<Option<ActionOutcome>> {
        self.ensure_open()?;
        if self.locked {
            return Ok(Some(ActionOutcome::Ignored(IgnoreReason::Locked)));
        }
        self.ensure_interacting(operation)?;
        if self.awaiting_confirmation {
            return Ok(Some(ActionOutcome::Ignored(
                IgnoreReason::AwaitingConfirmation,
            )));
        }
        Ok(None)
    }

    fn next_offered(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| !(s.has_immediate_interaction && s.awaits_input()))
    }

    fn rollback_offered(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.can_rollback && !(s.auto_continue && !self.auto_continue_paused))
    }
}

/// A step has work left when it asks for values, continues on its own, or
/// spawned child processes.
fn has_outstanding_work(state: &ProcessState) -> bool {
    state.has_interaction() || state.auto_continue || !state.children.is_empty()
}
