//! UI toolkit contract.
//!
//! The process client and the shell never draw anything themselves. They
//! talk to the toolkit through two traits:
//! - [`ProcessView`]: the parameter panel of one running process
//! - [`PanelBuilder`]: the container used by the shell's panels
//!
//! [`recording`] provides implementations that record every call.

pub mod recording;

use pd_protocol::process_models::{InteractionParameter, ProcessState};

/// Terminal screen shown when a process stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// The process reported `finished`.
    Completed {
        process_name: String,
        step: String,
        cancelled: bool,
    },
    /// The process was terminated by an unrecoverable error.
    Failed {
        process_name: String,
        message: String,
    },
}

impl Summary {
    pub fn completed(state: &ProcessState) -> Self {
        Summary::Completed {
            process_name: state.process_name.clone(),
            step: state.step.clone(),
            cancelled: state.cancelled,
        }
    }
}

/// Question posed by a yes/no message box.
///
/// The answer is delivered back through
/// [`ProcessExecutionClient::on_confirmation`](crate::client::ProcessExecutionClient::on_confirmation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    CancelProcess { process_name: String },
}

/// Parameter panel of a single process.
pub trait ProcessView: Send {
    /// Rebuild the whole panel for `state`.
    fn render(&mut self, state: &ProcessState);

    /// Update a rendered field in place.
    ///
    /// Returns `false` if the panel has no field for `parameter`.
    fn update_field(&mut self, parameter: &InteractionParameter) -> bool;

    /// Show a validation message next to `field`.
    ///
    /// Returns `false` if the panel has no such field.
    fn show_field_error(&mut self, field: &str, message: &str) -> bool;

    /// Show a message not bound to a field.
    fn show_message(&mut self, message: &str);

    /// Lock or unlock input and toggle the busy indicator.
    fn set_busy(&mut self, busy: bool);

    fn show_summary(&mut self, summary: &Summary);

    /// Pose a yes/no question.
    fn ask_confirmation(&mut self, confirmation: &Confirmation);

    /// Create the panel of a spawned child process.
    fn child_view(&mut self, state: &ProcessState) -> Box<dyn ProcessView>;
}

/// Container builder used by the shell's panels.
///
/// Buttons are identified by an action id; front-ends report activations
/// back to the shell as [`ShellAction`](crate::shell::ShellAction)s.
pub trait PanelBuilder: Send {
    /// Remove all content from `panel`.
    fn clear(&mut self, panel: &str);

    fn add_toolbar(&mut self, panel: &str, id: &str);

    fn add_button(&mut self, panel: &str, id: &str, label: &str, enabled: bool);

    fn add_label(&mut self, panel: &str, text: &str);

    /// Create the parameter panel for a newly started process.
    fn process_panel(&mut self, process_name: &str) -> Box<dyn ProcessView>;
}
