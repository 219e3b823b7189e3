//! Process script models for `.procdesk/processes/*.yaml`.
//!
//! A process script describes a server-side process as an ordered list of
//! interaction steps. Scripts are served by the in-memory scripted service
//! used for demos and tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Validation applied to a parameter value when a step is executed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterRule {
    /// The value must parse as a number.
    Number,
    /// The value must parse as a number greater than zero.
    Positive,
}

/// A parameter presented in a scripted step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ScriptParameter {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<ParameterRule>,
}

/// One step of a scripted process.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ScriptStep {
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ScriptParameter>,
    #[serde(default)]
    pub auto_continue: bool,
    #[serde(default)]
    pub can_rollback: bool,
    #[serde(default)]
    pub immediate_interaction: bool,
    /// Names of scripted processes spawned as children when this step is
    /// entered.
    #[serde(default)]
    pub spawn: Vec<String>,
}

/// A complete scripted process definition.
///
/// # Example
///
/// ```yaml
/// name: Checkout
/// steps:
///   - step: PaymentInfo
///     style: form
///     immediate-interaction: true
///     parameters:
///       - name: amount
///         label: Amount
///         required: true
///         rule: positive
///   - step: Confirm
///     can-rollback: true
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ProcessScript {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<ScriptStep>,
}
