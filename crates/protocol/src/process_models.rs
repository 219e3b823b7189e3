//! Process invocation and execution snapshot models.
//!
//! This module defines the values exchanged with the server-side process
//! engine: the descriptor used to start a process, the state snapshot
//! returned by every round-trip, and the mode selecting the next transition.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

/// Property key holding the display style of the current step.
pub const STYLE_PROPERTY: &str = "style";

/// Selects the server-side behavior for the next state transition.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Continue with the next step using the submitted parameters.
    Execute,

    /// Return to the previous interaction step.
    Rollback,

    /// Abort the process.
    Cancel,

    /// Re-request the current step without advancing.
    Reload,
}

/// Size of the client area available for rendering the process.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Identifies a process to start.
///
/// A descriptor is created once per process start and discarded after the
/// first [`ProcessState`] has been received.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ProcessDescriptor {
    /// Name of the server-side process definition.
    pub name: String,

    /// Optional input payload handed to the first step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,

    /// Locale used for labels and messages, e.g. `en-US`.
    pub locale: String,

    /// Client viewport at start time.
    #[serde(default)]
    pub viewport: Viewport,
}

impl ProcessDescriptor {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
            locale: locale.into(),
            viewport: Viewport::default(),
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

/// A named value the user supplies during an interaction step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct InteractionParameter {
    pub name: String,

    /// Human-readable label; falls back to `name` when empty.
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub value: Value,

    /// Whether the step cannot continue without a value.
    #[serde(default)]
    pub required: bool,

    /// Set by UI edits, cleared once folded into an outgoing request.
    #[serde(default)]
    pub modified: bool,
}

impl InteractionParameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            value,
            required: false,
            modified: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Label to display, defaulting to the parameter name.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Returns `true` when the parameter holds no usable value.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// Execution snapshot of a running server-side process.
///
/// Every round-trip yields a new value. Clients treat a snapshot as
/// immutable apart from the per-field `modified` markers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ProcessState {
    #[ts(type = "string")]
    pub id: Uuid,

    pub process_name: String,

    /// Name of the current step.
    pub step: String,

    /// Ordered interaction parameters of the current step.
    #[serde(default)]
    pub parameters: Vec<InteractionParameter>,

    #[serde(default)]
    pub finished: bool,

    /// The current step is the last one before the process finishes.
    #[serde(default)]
    pub final_step: bool,

    /// The next step should be requested without waiting for input.
    #[serde(default)]
    pub auto_continue: bool,

    #[serde(default)]
    pub can_rollback: bool,

    /// The step needs user input before it can continue; cancelling it
    /// needs no confirmation.
    #[serde(default)]
    pub has_immediate_interaction: bool,

    /// The process was finished by a cancellation.
    #[serde(default)]
    pub cancelled: bool,

    /// Child processes spawned by this step.
    #[serde(default)]
    pub children: Vec<ProcessState>,

    /// Free-form properties such as the display style.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ProcessState {
    /// Create an unfinished snapshot positioned at `step`.
    pub fn new(process_name: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            process_name: process_name.into(),
            step: step.into(),
            parameters: Vec::new(),
            finished: false,
            final_step: false,
            auto_continue: false,
            can_rollback: false,
            has_immediate_interaction: false,
            cancelled: false,
            children: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: InteractionParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.properties
            .insert(STYLE_PROPERTY.to_string(), style.into());
        self
    }

    /// Display style of the current step, if any.
    pub fn style(&self) -> Option<&str> {
        self.properties.get(STYLE_PROPERTY).map(String::as_str)
    }

    pub fn parameter(&self, name: &str) -> Option<&InteractionParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut InteractionParameter> {
        self.parameters.iter_mut().find(|p| p.name == name)
    }

    /// Returns `true` if the step still waits for user-supplied values.
    pub fn has_interaction(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Returns `true` while a required parameter has no value.
    pub fn awaits_input(&self) -> bool {
        self.parameters.iter().any(|p| p.required && p.is_empty())
    }

    /// Names of the parameters carrying a modification marker.
    pub fn modified_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.modified)
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn clear_modified(&mut self) {
        for parameter in &mut self.parameters {
            parameter.modified = false;
        }
    }
}
