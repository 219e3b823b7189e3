//! Sub-panels of the application shell.

use crate::client::ActionSet;
use crate::shell::error::ShellResult;
use crate::shell::panel::PanelManager;
use crate::ui::PanelBuilder;
use parking_lot::Mutex;
use pd_protocol::process_models::ProcessState;
use std::sync::Arc;

pub const TOOLBAR_PANEL: &str = "toolbar";
pub const LOGIN_PANEL: &str = "login";
pub const MESSAGE_PANEL: &str = "messages";

/// Toolbar with the process navigation buttons.
pub struct ToolbarPanel {
    parent: Arc<dyn PanelManager>,
}

impl ToolbarPanel {
    pub fn new(parent: Arc<dyn PanelManager>) -> Self {
        Self { parent }
    }

    /// Rebuild the toolbar for `actions`.
    ///
    /// The toolbar is empty while nobody is logged in.
    pub fn build(&self, builder: &mut dyn PanelBuilder, actions: ActionSet, logged_in: bool) {
        builder.clear(TOOLBAR_PANEL);
        if !logged_in {
            return;
        }

        builder.add_toolbar(TOOLBAR_PANEL, "process");
        builder.add_button(TOOLBAR_PANEL, "previous", "Previous", actions.previous);
        builder.add_button(TOOLBAR_PANEL, "next", "Next", actions.next);
        builder.add_button(TOOLBAR_PANEL, "reload", "Reload", actions.reload);
        builder.add_button(TOOLBAR_PANEL, "cancel", "Cancel", actions.cancel);
        builder.add_button(TOOLBAR_PANEL, "logout", "Log out", true);
    }
}

impl PanelManager for ToolbarPanel {
    fn name(&self) -> &str {
        TOOLBAR_PANEL
    }

    fn parent(&self) -> Option<&Arc<dyn PanelManager>> {
        Some(&self.parent)
    }
}

/// Login form.
pub struct LoginPanel {
    parent: Arc<dyn PanelManager>,
}

impl LoginPanel {
    pub fn new(parent: Arc<dyn PanelManager>) -> Self {
        Self { parent }
    }

    pub fn build(&self, builder: &mut dyn PanelBuilder, error: Option<&str>) {
        builder.clear(LOGIN_PANEL);
        builder.add_label(LOGIN_PANEL, "Please log in");
        if let Some(error) = error {
            builder.add_label(LOGIN_PANEL, error);
        }
        builder.add_button(LOGIN_PANEL, "login", "Log in", true);
    }

    pub fn hide(&self, builder: &mut dyn PanelBuilder) {
        builder.clear(LOGIN_PANEL);
    }
}

impl PanelManager for LoginPanel {
    fn name(&self) -> &str {
        LOGIN_PANEL
    }

    fn parent(&self) -> Option<&Arc<dyn PanelManager>> {
        Some(&self.parent)
    }
}

/// Message area below the process panel.
pub struct MessagePanel {
    parent: Arc<dyn PanelManager>,
    messages: Mutex<Vec<String>>,
}

impl MessagePanel {
    pub fn new(parent: Arc<dyn PanelManager>) -> Self {
        Self {
            parent,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        self.messages.lock().push(message.into());
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }

    pub fn build(&self, builder: &mut dyn PanelBuilder) {
        builder.clear(MESSAGE_PANEL);
        for message in self.messages.lock().iter() {
            builder.add_label(MESSAGE_PANEL, message);
        }
    }
}

impl PanelManager for MessagePanel {
    fn name(&self) -> &str {
        MESSAGE_PANEL
    }

    fn parent(&self) -> Option<&Arc<dyn PanelManager>> {
        Some(&self.parent)
    }

    /// Messages belong to the step that produced them.
    fn process_updated(&self, state: &ProcessState) -> ShellResult<()> {
        self.clear();
        self.parent.process_updated(state)
    }
}
