//! Parent-delegating panel managers.

use crate::shell::error::{ShellError, ShellResult};
use pd_protocol::process_models::ProcessState;
use pd_protocol::session_models::UserData;
use std::sync::Arc;

/// A node in the shell's panel tree.
///
/// Lifecycle methods forward to the parent by default. Only the root panel
/// implements them; a panel without a parent that does not override a
/// method reports [`ShellError::Unhandled`].
pub trait PanelManager: Send + Sync {
    fn name(&self) -> &str;

    fn parent(&self) -> Option<&Arc<dyn PanelManager>>;

    /// The top-level process reached a terminal state.
    fn process_finished(&self, state: &ProcessState) -> ShellResult<()> {
        match self.parent() {
            Some(parent) => parent.process_finished(state),
            None => Err(unhandled(self.name(), "process_finished")),
        }
    }

    /// A process produced a new interactive snapshot.
    fn process_updated(&self, state: &ProcessState) -> ShellResult<()> {
        match self.parent() {
            Some(parent) => parent.process_updated(state),
            None => Err(unhandled(self.name(), "process_updated")),
        }
    }

    /// The authenticated user, if any.
    fn user_data(&self) -> ShellResult<Option<UserData>> {
        match self.parent() {
            Some(parent) => parent.user_data(),
            None => Err(unhandled(self.name(), "user_data")),
        }
    }

    fn logout(&self) -> ShellResult<()> {
        match self.parent() {
            Some(parent) => parent.logout(),
            None => Err(unhandled(self.name(), "logout")),
        }
    }
}

fn unhandled(panel: &str, operation: &'static str) -> ShellError {
    ShellError::Unhandled {
        panel: panel.to_string(),
        operation,
    }
}
