//! Root of the panel tree and owner of the application session.

use crate::shell::error::ShellResult;
use crate::shell::panel::PanelManager;
use parking_lot::RwLock;
use pd_protocol::process_models::ProcessState;
use pd_protocol::session_models::UserData;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Authenticated user and the latest snapshot of every live process.
#[derive(Debug, Clone, Default)]
pub struct ApplicationSession {
    pub user: Option<UserData>,
    pub snapshots: HashMap<Uuid, ProcessState>,
}

/// Root panel. Implements every lifecycle method of [`PanelManager`].
#[derive(Debug, Default)]
pub struct RootPanel {
    session: RwLock<ApplicationSession>,
}

impl RootPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `user`, discarding any previous one.
    pub fn sign_in(&self, user: UserData) {
        let mut session = self.session.write();
        session.snapshots.clear();
        session.user = Some(user);
    }

    pub fn user(&self) -> Option<UserData> {
        self.session.read().user.clone()
    }

    pub fn snapshot(&self, id: Uuid) -> Option<ProcessState> {
        self.session.read().snapshots.get(&id).cloned()
    }

    pub fn snapshot_count(&self) -> usize {
        self.session.read().snapshots.len()
    }

    /// Drop the snapshot of a process that ended.
    pub fn forget(&self, id: Uuid) {
        self.session.write().snapshots.remove(&id);
    }

    /// A copy of the current session.
    pub fn session(&self) -> ApplicationSession {
        self.session.read().clone()
    }
}

impl PanelManager for RootPanel {
    fn name(&self) -> &str {
        "root"
    }

    fn parent(&self) -> Option<&Arc<dyn PanelManager>> {
        None
    }

    /// The main process ended: the session is over.
    fn process_finished(&self, state: &ProcessState) -> ShellResult<()> {
        info!(process = %state.process_name, cancelled = state.cancelled, "main process finished");
        self.forget(state.id);
        self.logout()
    }

    fn process_updated(&self, state: &ProcessState) -> ShellResult<()> {
        self.session
            .write()
            .snapshots
            .insert(state.id, state.clone());
        Ok(())
    }

    fn user_data(&self) -> ShellResult<Option<UserData>> {
        Ok(self.user())
    }

    fn logout(&self) -> ShellResult<()> {
        let mut session = self.session.write();
        if let Some(user) = session.user.take() {
            info!(user = %user.user_id, "session closed");
        }
        session.snapshots.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> UserData {
        UserData {
            user_id: "alice".to_string(),
            display_name: "Alice".to_string(),
            locale: None,
            roles: vec!["user".to_string()],
            logged_in_at: Utc::now(),
        }
    }

    #[test]
    fn test_updates_are_registered_per_process() {
        let root = RootPanel::new();
        root.sign_in(user());
        let state = ProcessState::new("Checkout", "PaymentInfo");

        root.process_updated(&state).unwrap();
        root.process_updated(&ProcessState::new("Checkout", "Confirm")).unwrap();

        assert_eq!(root.snapshot_count(), 2);
        assert_eq!(root.snapshot(state.id).map(|s| s.step), Some("PaymentInfo".to_string()));
    }

    #[test]
    fn test_process_finished_logs_out() {
        let root = RootPanel::new();
        root.sign_in(user());
        let state = ProcessState::new("Main", "Done");
        root.process_updated(&state).unwrap();

        root.process_finished(&state).unwrap();

        assert!(root.user_data().unwrap().is_none());
        assert_eq!(root.snapshot_count(), 0);
    }
}
