//! In-memory service stub serving scripted processes.
//!
//! `ScriptedServer` implements every service capability against a set of
//! [`ProcessScript`] definitions. It stands in for the application server in
//! demos and tests.

use crate::services::base::{AuthService, CommandService, ServiceStub, StorageService};
use async_trait::async_trait;
use chrono::Utc;
use pd_protocol::error_models::{ServiceError, ServiceResult};
use pd_protocol::ipc::{ExecuteRequest, InteractionEventKind};
use pd_protocol::process_models::{ExecutionMode, InteractionParameter, ProcessState, STYLE_PROPERTY};
use pd_protocol::script_models::{ParameterRule, ProcessScript, ScriptStep};
use pd_protocol::session_models::{Credentials, UserData};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Child spawning stops at this depth to keep recursive scripts finite.
const MAX_SPAWN_DEPTH: usize = 4;

/// Server-side bookkeeping of one running scripted process.
#[derive(Debug, Clone)]
struct Instance {
    script: String,
    index: usize,
    values: BTreeMap<String, Value>,
    /// Instance that spawned this one.
    parent: Option<Uuid>,
    depth: usize,
    /// Steps whose children were already spawned.
    spawned: BTreeSet<usize>,
}

#[derive(Default)]
struct ServerState {
    instances: HashMap<Uuid, Instance>,
    storage: HashMap<String, String>,
    injected: VecDeque<ServiceError>,
    executed: Vec<ExecutionMode>,
}

/// Scripted stand-in for the application server.
pub struct ScriptedServer {
    scripts: HashMap<String, ProcessScript>,
    passwords: HashMap<String, String>,
    state: Mutex<ServerState>,
}

impl ScriptedServer {
    pub fn new(scripts: Vec<ProcessScript>) -> Self {
        Self {
            scripts: scripts.into_iter().map(|s| (s.name.clone(), s)).collect(),
            passwords: HashMap::new(),
            state: Mutex::new(ServerState::default()),
        }
    }

    /// Require `password` for `user`. Users without a password accept any.
    pub fn with_user(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.passwords.insert(user.into(), password.into());
        self
    }

    /// Names of all scripted processes, sorted.
    pub fn process_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scripts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Make the next command execution fail with `error`.
    pub async fn fail_next(&self, error: ServiceError) {
        self.state.lock().await.injected.push_back(error);
    }

    /// Execution modes of all commands received so far.
    pub async fn executed_modes(&self) -> Vec<ExecutionMode> {
        self.state.lock().await.executed.clone()
    }

    /// Number of process instances still running.
    pub async fn running_instances(&self) -> usize {
        self.state.lock().await.instances.len()
    }

    fn script(&self, name: &str) -> ServiceResult<&ProcessScript> {
        self.scripts.get(name).ok_or_else(|| {
            ServiceError::unrecoverable(format!("Unknown process '{name}'"))
        })
    }

    fn start_instance(
        &self,
        state: &mut ServerState,
        name: &str,
        input: Option<&Value>,
        parent: Option<Uuid>,
        depth: usize,
    ) -> ServiceResult<ProcessState> {
        let script = self.script(name)?;
        let mut values = BTreeMap::new();
        if let Some(Value::Object(map)) = input {
            for (key, value) in map {
                values.insert(key.clone(), value.clone());
            }
        }

        let id = Uuid::new_v4();
        let mut instance = Instance {
            script: script.name.clone(),
            index: 0,
            values,
            parent,
            depth,
            spawned: BTreeSet::new(),
        };
        let snapshot = self.snapshot(state, id, &mut instance)?;
        state.instances.insert(id, instance);
        debug!(process = %name, %id, "scripted process started");
        Ok(snapshot)
    }

    fn snapshot(
        &self,
        state: &mut ServerState,
        id: Uuid,
        instance: &mut Instance,
    ) -> ServiceResult<ProcessState> {
        let script = self.script(&instance.script)?;
        let Some(step) = script.steps.get(instance.index) else {
            return Err(ServiceError::unrecoverable(format!(
                "Process '{}' has no step {}",
                script.name, instance.index
            )));
        };

        let mut snapshot = ProcessState::new(script.name.clone(), step.step.clone());
        snapshot.id = id;
        snapshot.parameters = step
            .parameters
            .iter()
            .map(|p| {
                let value = instance
                    .values
                    .get(&p.name)
                    .cloned()
                    .unwrap_or_else(|| p.default.clone());
                let mut parameter = InteractionParameter::new(p.name.clone(), value)
                    .with_label(p.label.clone());
                parameter.required = p.required;
                parameter
            })
            .collect();
        snapshot.final_step = instance.index + 1 == script.steps.len();
        snapshot.auto_continue = step.auto_continue;
        snapshot.can_rollback = step.can_rollback && instance.index > 0;
        snapshot.has_immediate_interaction = step.immediate_interaction;
        if let Some(style) = &step.style {
            snapshot
                .properties
                .insert(STYLE_PROPERTY.to_string(), style.clone());
        }

        let first_entry = instance.spawned.insert(instance.index);
        if first_entry && instance.depth < MAX_SPAWN_DEPTH {
            for child in &step.spawn {
                let child_state =
                    self.start_instance(state, child, None, Some(id), instance.depth + 1)?;
                snapshot.children.push(child_state);
            }
        }

        Ok(snapshot)
    }

    fn finished(process_name: &str, id: Uuid, step: &str, cancelled: bool) -> ProcessState {
        let mut snapshot = ProcessState::new(process_name, step);
        snapshot.id = id;
        snapshot.finished = true;
        snapshot.cancelled = cancelled;
        snapshot
    }

    fn continue_instance(
        &self,
        state: &mut ServerState,
        submitted: ProcessState,
        mode: ExecutionMode,
        field_changed: bool,
    ) -> ServiceResult<ProcessState> {
        let id = submitted.id;
        let Some(mut instance) = state.instances.get(&id).cloned() else {
            return Err(ServiceError::unrecoverable(format!(
                "Unknown process instance {id}"
            )));
        };
        let script = self.script(&instance.script)?;
        let step_count = script.steps.len();

        match mode {
            ExecutionMode::Cancel => {
                remove_instance(state, id);
                return Ok(Self::finished(&script.name, id, &submitted.step, true));
            }
            ExecutionMode::Reload => {}
            ExecutionMode::Rollback => {
                let can_rollback = script
                    .steps
                    .get(instance.index)
                    .is_some_and(|s| s.can_rollback);
                if !can_rollback || instance.index == 0 {
                    return Err(ServiceError::recoverable("Rollback is not possible here"));
                }
                instance.index -= 1;
            }
            ExecutionMode::Execute => {
                let step = script.steps.get(instance.index).ok_or_else(|| {
                    ServiceError::unrecoverable(format!("Process '{}' is out of steps", script.name))
                })?;
                for parameter in &submitted.parameters {
                    instance
                        .values
                        .insert(parameter.name.clone(), parameter.value.clone());
                }
                if !field_changed {
                    validate(step, &instance.values)?;
                    instance.index += 1;
                }
            }
        }

        if instance.index >= step_count {
            remove_instance(state, id);
            return Ok(Self::finished(&script.name, id, &submitted.step, false));
        }

        let snapshot = self.snapshot(state, id, &mut instance)?;
        state.instances.insert(id, instance);
        Ok(snapshot)
    }
}

/// Drop `id` together with every process it spawned.
fn remove_instance(state: &mut ServerState, id: Uuid) {
    if state.instances.remove(&id).is_none() {
        return;
    }
    let children: Vec<Uuid> = state
        .instances
        .iter()
        .filter(|(_, instance)| instance.parent == Some(id))
        .map(|(child, _)| *child)
        .collect();
    for child in children {
        debug!(parent = %id, %child, "dropping spawned process");
        remove_instance(state, child);
    }
}

/// Check the submitted values against the step's parameter definitions.
fn validate(step: &ScriptStep, values: &BTreeMap<String, Value>) -> ServiceResult<()> {
    let mut error: Option<ServiceError> = None;

    for parameter in &step.parameters {
        let value = values.get(&parameter.name).unwrap_or(&Value::Null);
        let probe = InteractionParameter::new(parameter.name.clone(), value.clone());

        let message = if parameter.required && probe.is_empty() {
            Some("is required")
        } else if probe.is_empty() {
            None
        } else {
            match (parameter.rule, as_number(value)) {
                (Some(ParameterRule::Number), None) => Some("must be a number"),
                (Some(ParameterRule::Positive), None) => Some("must be a number"),
                (Some(ParameterRule::Positive), Some(n)) if n <= 0.0 => Some("must be positive"),
                _ => None,
            }
        };

        if let Some(message) = message {
            error = Some(
                error
                    .unwrap_or_else(|| ServiceError::recoverable("Validation failed"))
                    .with_field_error(parameter.name.clone(), message),
            );
        }
    }

    match error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl CommandService for ScriptedServer {
    async fn execute(&self, request: ExecuteRequest) -> ServiceResult<ProcessState> {
        let mut state = self.state.lock().await;
        state.executed.push(request.mode());

        if let Some(error) = state.injected.pop_front() {
            return Err(error);
        }

        match request {
            ExecuteRequest::Start { descriptor } => {
                let input = descriptor.input.as_ref();
                self.start_instance(&mut state, &descriptor.name, input, None, 0)
            }
            ExecuteRequest::Continue {
                state: submitted,
                mode,
                event,
            } => {
                let field_changed = event
                    .as_ref()
                    .is_some_and(|e| e.kind == InteractionEventKind::FieldChanged);
                self.continue_instance(&mut state, submitted, mode, field_changed)
            }
        }
    }
}

#[async_trait]
impl AuthService for ScriptedServer {
    async fn login(&self, credentials: Credentials) -> ServiceResult<UserData> {
        let user = credentials.user.trim();
        if user.is_empty() {
            return Err(ServiceError::recoverable("Login failed")
                .with_field_error("user", "is required"));
        }
        if let Some(expected) = self.passwords.get(user) {
            if *expected != credentials.password {
                return Err(ServiceError::recoverable("Invalid user name or password"));
            }
        }

        Ok(UserData {
            user_id: user.to_string(),
            display_name: user.to_string(),
            locale: None,
            roles: vec!["user".to_string()],
            logged_in_at: Utc::now(),
        })
    }

    async fn logout(&self, user_id: &str) -> ServiceResult<()> {
        debug!(user = %user_id, "scripted logout");
        Ok(())
    }
}

#[async_trait]
impl StorageService for ScriptedServer {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        Ok(self.state.lock().await.storage.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> ServiceResult<()> {
        self.state.lock().await.storage.insert(key.to_string(), value);
        Ok(())
    }
}

impl ServiceStub for ScriptedServer {
    fn command_service(self: Arc<Self>) -> Option<Arc<dyn CommandService>> {
        Some(self)
    }

    fn auth_service(self: Arc<Self>) -> Option<Arc<dyn AuthService>> {
        Some(self)
    }

    fn storage_service(self: Arc<Self>) -> Option<Arc<dyn StorageService>> {
        Some(self)
    }
}
