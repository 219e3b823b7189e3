//! Terminal implementations of the UI contract.

use colored::Colorize;
use parking_lot::Mutex;
use pd_core::ui::{Confirmation, PanelBuilder, ProcessView, Summary};
use pd_protocol::process_models::{InteractionParameter, ProcessState};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) if s.is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Prints the parameter panel of one process.
#[derive(Default)]
pub struct ConsoleView {
    indent: String,
    fields: BTreeSet<String>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    fn nested(depth: usize) -> Self {
        Self {
            indent: "  ".repeat(depth),
            fields: BTreeSet::new(),
        }
    }

    fn print_field(&self, parameter: &InteractionParameter) {
        let marker = if parameter.required { "*" } else { "" };
        println!(
            "{}  {}{}: {}",
            self.indent,
            parameter.display_label(),
            marker,
            display_value(&parameter.value)
        );
    }
}

impl ProcessView for ConsoleView {
    fn render(&mut self, state: &ProcessState) {
        println!(
            "{}{}",
            self.indent,
            format!("== {} / {} ==", state.process_name, state.step).bold()
        );
        self.fields.clear();
        for parameter in &state.parameters {
            self.fields.insert(parameter.name.clone());
            self.print_field(parameter);
        }
    }

    fn update_field(&mut self, parameter: &InteractionParameter) -> bool {
        if !self.fields.contains(&parameter.name) {
            return false;
        }
        self.print_field(parameter);
        true
    }

    fn show_field_error(&mut self, field: &str, message: &str) -> bool {
        if !self.fields.contains(field) {
            return false;
        }
        println!("{}  {} {field}: {message}", self.indent, "!".red().bold());
        true
    }

    fn show_message(&mut self, message: &str) {
        println!("{}{}", self.indent, message.yellow());
    }

    fn set_busy(&mut self, _busy: bool) {}

    fn show_summary(&mut self, summary: &Summary) {
        let line = match summary {
            Summary::Completed {
                process_name,
                cancelled: true,
                ..
            } => format!("{process_name} was cancelled").yellow(),
            Summary::Completed {
                process_name, step, ..
            } => format!("{process_name} finished at {step}").green(),
            Summary::Failed {
                process_name,
                message,
            } => format!("{process_name} failed: {message}").red(),
        };
        println!("{}{line}", self.indent);
    }

    fn ask_confirmation(&mut self, confirmation: &Confirmation) {
        match confirmation {
            Confirmation::CancelProcess { process_name } => {
                println!("{}Cancel {process_name}? (yes/no)", self.indent);
            }
        }
    }

    fn child_view(&mut self, state: &ProcessState) -> Box<dyn ProcessView> {
        let depth = self.indent.len() / 2 + 1;
        println!("{}{} {}", self.indent, "+".cyan(), state.process_name);
        Box::new(ConsoleView::nested(depth))
    }
}

#[derive(Debug, Clone)]
struct Button {
    id: String,
    enabled: bool,
}

/// Current toolbar buttons, shared with the input loop for the prompt.
#[derive(Debug, Clone, Default)]
pub struct Toolbar(Arc<Mutex<Vec<Button>>>);

impl Toolbar {
    /// Prompt line listing the enabled actions.
    pub fn prompt(&self) -> String {
        let buttons = self.0.lock();
        let enabled: Vec<&str> = buttons
            .iter()
            .filter(|b| b.enabled)
            .map(|b| b.id.as_str())
            .collect();
        format!("[{}]>", enabled.join(" "))
    }
}

/// Prints the shell's panels.
#[derive(Default)]
pub struct ConsolePanels {
    toolbar: Toolbar,
}

impl ConsolePanels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toolbar(&self) -> Toolbar {
        self.toolbar.clone()
    }
}

impl PanelBuilder for ConsolePanels {
    fn clear(&mut self, panel: &str) {
        if panel == pd_core::shell::panels::TOOLBAR_PANEL {
            self.toolbar.0.lock().clear();
        }
    }

    fn add_toolbar(&mut self, _panel: &str, _id: &str) {}

    fn add_button(&mut self, panel: &str, id: &str, _label: &str, enabled: bool) {
        if panel == pd_core::shell::panels::TOOLBAR_PANEL {
            self.toolbar.0.lock().push(Button {
                id: id.to_string(),
                enabled,
            });
        }
    }

    fn add_label(&mut self, panel: &str, text: &str) {
        if panel == pd_core::shell::panels::LOGIN_PANEL {
            println!("{}", text.dimmed());
        } else {
            println!("{}", text.yellow());
        }
    }

    fn process_panel(&mut self, _process_name: &str) -> Box<dyn ProcessView> {
        Box::new(ConsoleView::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_lists_enabled_buttons() {
        let mut panels = ConsolePanels::new();
        let toolbar = panels.toolbar();
        panels.clear("toolbar");
        panels.add_button("toolbar", "next", "Next", true);
        panels.add_button("toolbar", "previous", "Previous", false);
        panels.add_button("toolbar", "logout", "Log out", true);

        assert_eq!(toolbar.prompt(), "[next logout]>");
    }

    #[test]
    fn test_update_requires_rendered_field() {
        let mut view = ConsoleView::new();
        let parameter = InteractionParameter::new("amount", json!(3));
        assert!(!view.update_field(&parameter));

        view.render(&ProcessState::new("Checkout", "PaymentInfo").with_parameter(parameter.clone()));
        assert!(view.update_field(&parameter));
        assert!(!view.show_field_error("iban", "invalid"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), "-");
        assert_eq!(display_value(&json!("")), "-");
        assert_eq!(display_value(&json!(20)), "20");
    }
}
