//! The application shell.
//!
//! `ApplicationShell` owns the panel tree, the service handle and the client
//! of the main process. It executes every [`Dispatch`] emitted by the client
//! tree through the command capability and routes the result back.

use crate::client::{
    ActionOutcome, ActionSet, ClientChannels, ClientError, Dispatch, ProcessExecutionClient,
};
use crate::services::{Capability, RemoteServiceHandle};
use crate::shell::error::{ShellError, ShellResult};
use crate::shell::panel::PanelManager;
use crate::shell::panels::{LoginPanel, MessagePanel, ToolbarPanel, LOGIN_PANEL};
use crate::shell::root::RootPanel;
use crate::ui::PanelBuilder;
use pd_protocol::config_models::ClientConfig;
use pd_protocol::error_models::ServiceError;
use pd_protocol::ipc::{Event, InteractionEvent, InteractionEventKind};
use pd_protocol::process_models::{InteractionParameter, ProcessDescriptor};
use pd_protocol::session_models::{Credentials, UserData};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

/// Storage key of the last user that logged in successfully.
pub const LAST_USER_KEY: &str = "last_user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellPhase {
    /// Waiting for credentials.
    LoggedOut,
    /// A user is logged in and the main process runs.
    Active,
    /// The main process failed; only logout is possible.
    Failed,
}

/// User input, as reported by a front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellAction {
    Next,
    Previous,
    Cancel,
    Reload,
    /// Answer to the cancel confirmation.
    Confirm(bool),
    /// A field was edited; nothing is sent yet.
    Edit { name: String, value: Value },
    /// A field was edited and submitted.
    Submit { name: String, value: Value },
    PauseAutoContinue,
    ResumeAutoContinue,
    Logout,
}

impl ShellAction {
    /// Map a toolbar or dialog button id to its action.
    pub fn from_button(id: &str) -> Option<Self> {
        match id {
            "next" => Some(ShellAction::Next),
            "previous" => Some(ShellAction::Previous),
            "cancel" => Some(ShellAction::Cancel),
            "reload" => Some(ShellAction::Reload),
            "logout" => Some(ShellAction::Logout),
            "yes" => Some(ShellAction::Confirm(true)),
            "no" => Some(ShellAction::Confirm(false)),
            _ => None,
        }
    }
}

pub struct ApplicationShell {
    config: ClientConfig,
    services: RemoteServiceHandle,
    builder: Box<dyn PanelBuilder>,
    root: Arc<RootPanel>,
    toolbar: ToolbarPanel,
    login: LoginPanel,
    messages: MessagePanel,
    phase: ShellPhase,
    client: Option<ProcessExecutionClient>,
    channels: ClientChannels,
    dispatch_rx: UnboundedReceiver<Dispatch>,
    events_rx: UnboundedReceiver<Event>,
}

impl ApplicationShell {
    /// Create a shell showing the login panel.
    ///
    /// # Arguments
    ///
    /// * `config` - Client settings, including the main process to start
    /// * `services` - Handle over the registered service stub
    /// * `builder` - Toolkit container for the shell's panels
    pub fn new(
        config: ClientConfig,
        services: RemoteServiceHandle,
        mut builder: Box<dyn PanelBuilder>,
    ) -> Self {
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let root = Arc::new(RootPanel::new());
        let parent: Arc<dyn PanelManager> = root.clone();
        let login = LoginPanel::new(Arc::clone(&parent));
        login.build(builder.as_mut(), None);

        Self {
            config,
            services,
            builder,
            root,
            toolbar: ToolbarPanel::new(Arc::clone(&parent)),
            login,
            messages: MessagePanel::new(parent),
            phase: ShellPhase::LoggedOut,
            client: None,
            channels: ClientChannels {
                dispatch_tx,
                events_tx,
            },
            dispatch_rx,
            events_rx,
        }
    }

    pub fn phase(&self) -> ShellPhase {
        self.phase
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Client of the main process, if one was started.
    pub fn client(&self) -> Option<&ProcessExecutionClient> {
        self.client.as_ref()
    }

    pub fn root(&self) -> &Arc<RootPanel> {
        &self.root
    }

    pub fn user(&self) -> Option<UserData> {
        self.root.user()
    }

    /// Messages currently shown in the message area.
    pub fn messages(&self) -> Vec<String> {
        self.messages.messages()
    }

    /// Actions currently offered by the toolbar.
    pub fn available_actions(&self) -> ActionSet {
        self.client
            .as_ref()
            .map(ProcessExecutionClient::available_actions)
            .unwrap_or_default()
    }

    /// Authenticate and start the main process.
    ///
    /// A rejected login keeps the shell logged out and shows the reason on
    /// the login panel.
    pub async fn login(&mut self, credentials: Credentials) -> ShellResult<()> {
        if self.phase != ShellPhase::LoggedOut {
            return Err(ShellError::AlreadyLoggedIn);
        }
        let auth = self
            .services
            .auth_service()
            .ok_or(ShellError::MissingCapability(Capability::Authentication))?;

        let user = match auth.login(credentials).await {
            Ok(user) => user,
            Err(error) => {
                warn!(%error, "login rejected");
                self.login.build(self.builder.as_mut(), Some(error.message()));
                return Err(error.into());
            }
        };

        info!(user = %user.user_id, "user logged in");
        if let Some(storage) = self.services.storage_service() {
            if let Err(error) = storage.put(LAST_USER_KEY, user.user_id.clone()).await {
                warn!(%error, "could not remember last user");
            }
        }

        self.root.sign_in(user);
        self.phase = ShellPhase::Active;
        self.login.hide(self.builder.as_mut());
        self.start_main_process()?;
        self.pump().await
    }

    /// Name of the last user that logged in, from server storage.
    pub async fn last_user(&self) -> ShellResult<Option<String>> {
        let storage = self
            .services
            .storage_service()
            .ok_or(ShellError::MissingCapability(Capability::Storage))?;
        Ok(storage.get(LAST_USER_KEY).await?)
    }

    /// Apply a user action to the main process and run the resulting
    /// request cycle to completion.
    pub async fn handle_action(&mut self, action: ShellAction) -> ShellResult<ActionOutcome> {
        if action == ShellAction::Logout {
            self.logout().await?;
            return Ok(ActionOutcome::Sent);
        }

        let client = self.client.as_mut().ok_or(ShellError::NoActiveProcess)?;
        let outcome = match action {
            ShellAction::Next => client.advance()?,
            ShellAction::Previous => client.rollback()?,
            ShellAction::Cancel => client.cancel()?,
            ShellAction::Reload => client.reload()?,
            ShellAction::Confirm(accepted) => client.on_confirmation(accepted)?,
            ShellAction::Edit { name, value } => client.record_edit(&name, value)?,
            ShellAction::Submit { name, value } => {
                let event = InteractionEvent::new(InteractionEventKind::Action, name.clone());
                client.submit_interaction(vec![InteractionParameter::new(name, value)], event)?
            }
            ShellAction::PauseAutoContinue => {
                client.pause_auto_continue();
                ActionOutcome::Recorded
            }
            ShellAction::ResumeAutoContinue => client.resume_auto_continue()?,
            ShellAction::Logout => ActionOutcome::Sent,
        };
        debug!(?outcome, "action handled");

        self.pump().await?;
        Ok(outcome)
    }

    /// Close the session and return to the login panel.
    pub async fn logout(&mut self) -> ShellResult<()> {
        if self.phase == ShellPhase::LoggedOut {
            return Err(ShellError::NotLoggedIn);
        }
        let user = self.root.user();
        self.toolbar.logout()?;
        self.close_session(user).await;
        Ok(())
    }

    fn start_main_process(&mut self) -> ShellResult<()> {
        let user = self.root.user().ok_or(ShellError::NotLoggedIn)?;
        let locale = user.locale.unwrap_or_else(|| self.config.locale.clone());
        let descriptor = ProcessDescriptor::new(self.config.main_process.clone(), locale)
            .with_viewport(self.config.viewport);

        let view = self.builder.process_panel(&descriptor.name);
        let mut client = ProcessExecutionClient::new(view, self.channels.clone())
            .with_auto_continue(self.config.auto_continue);
        client.start(descriptor)?;
        self.client = Some(client);
        self.refresh_panels();
        Ok(())
    }

    /// Execute queued dispatches until the client tree is quiet.
    async fn pump(&mut self) -> ShellResult<()> {
        loop {
            self.drain_events().await?;
            let Ok(dispatch) = self.dispatch_rx.try_recv() else {
                break;
            };

            let result = match self.services.command_service() {
                Some(command) => command.execute(dispatch.request).await,
                None => Err(ServiceError::unrecoverable(format!(
                    "The registered service stub does not provide {}",
                    Capability::CommandExecution
                ))),
            };

            let Some(client) = self.client.as_mut() else {
                warn!(client = %dispatch.client_id, "dropping response, no process is running");
                continue;
            };
            match client.route(dispatch.client_id, result) {
                Ok(()) => {}
                Err(ClientError::UnknownClient(id)) => {
                    warn!(client = %id, "dropping response for a closed process");
                }
                Err(error) => return Err(error.into()),
            }
        }

        self.refresh_panels();
        Ok(())
    }

    async fn drain_events(&mut self) -> ShellResult<()> {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: Event) -> ShellResult<()> {
        let main_id = self.client.as_ref().map(ProcessExecutionClient::id);
        let is_main = main_id == Some(event.client_id());

        match event {
            Event::ProcessStarted {
                client_id,
                process_name,
            } => {
                debug!(client = %client_id, process = %process_name, "process started");
            }
            Event::ProcessUpdated { state, .. } => {
                if is_main {
                    self.messages.process_updated(&state)?;
                } else {
                    self.root.process_updated(&state)?;
                }
            }
            Event::ProcessFinished { state, .. } => {
                if is_main {
                    let user = self.root.user();
                    self.toolbar.process_finished(&state)?;
                    self.close_session(user).await;
                } else {
                    self.root.forget(state.id);
                    self.messages
                        .push(format!("{} finished", state.process_name));
                }
            }
            Event::ProcessFailed { error, .. } => {
                if is_main {
                    self.phase = ShellPhase::Failed;
                }
                self.messages.push(error);
            }
        }
        Ok(())
    }

    async fn close_session(&mut self, user: Option<UserData>) {
        if let (Some(user), Some(auth)) = (user, self.services.auth_service()) {
            if let Err(error) = auth.logout(&user.user_id).await {
                warn!(%error, user = %user.user_id, "server logout failed");
            }
        }

        self.client = None;
        while self.dispatch_rx.try_recv().is_ok() {}
        while self.events_rx.try_recv().is_ok() {}
        self.messages.clear();
        self.phase = ShellPhase::LoggedOut;
        self.login.build(self.builder.as_mut(), None);
        self.refresh_panels();
    }

    fn refresh_panels(&mut self) {
        let actions = self.available_actions();
        let logged_in = self.phase != ShellPhase::LoggedOut;
        self.toolbar.build(self.builder.as_mut(), actions, logged_in);
        self.messages.build(self.builder.as_mut());
        if logged_in {
            self.builder.clear(LOGIN_PANEL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_ids_map_to_actions() {
        assert_eq!(ShellAction::from_button("next"), Some(ShellAction::Next));
        assert_eq!(ShellAction::from_button("no"), Some(ShellAction::Confirm(false)));
        assert_eq!(ShellAction::from_button("print"), None);
    }
}
