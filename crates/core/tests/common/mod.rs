//! Shared fixtures for pd-core integration tests.

use pd_core::client::{ClientChannels, Dispatch, ProcessExecutionClient};
use pd_core::config::loader::load_config;
use pd_core::services::{CommandService, RemoteServiceHandle, ScriptedServer};
use pd_core::shell::ApplicationShell;
use pd_core::ui::recording::{PanelProbe, RecordingPanels, RecordingView, ViewProbe};
use pd_protocol::ipc::Event;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

pub const CONFIG_TOML: &str = r#"
main_process = "Checkout"
locale = "en-US"
auto_continue = true

[viewport]
width = 1280
height = 800
"#;

pub const CHECKOUT_YAML: &str = r#"
name: Checkout
description: Pay for the shopping cart
steps:
  - step: PaymentInfo
    style: form
    immediate-interaction: true
    parameters:
      - name: amount
        label: Amount
        required: true
        rule: positive
  - step: Confirm
    can-rollback: true
"#;

pub const IMPORT_YAML: &str = r#"
name: Import
steps:
  - step: Reading
    auto-continue: true
  - step: Review
    can-rollback: true
"#;

pub const ORDER_YAML: &str = r#"
name: Order
steps:
  - step: Overview
    spawn:
      - Notify
  - step: Done
"#;

pub const NOTIFY_YAML: &str = r#"
name: Notify
steps:
  - step: Sending
    auto-continue: true
"#;

/// Create a temporary project directory with a `.procdesk` configuration.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();
    let processes = root.join(".procdesk/processes");
    std::fs::create_dir_all(&processes)?;

    std::fs::write(root.join(".procdesk/config.toml"), CONFIG_TOML)?;
    std::fs::write(processes.join("checkout.yaml"), CHECKOUT_YAML)?;
    std::fs::write(processes.join("import.yaml"), IMPORT_YAML)?;
    std::fs::write(processes.join("order.yaml"), ORDER_YAML)?;
    std::fs::write(processes.join("notify.yml"), NOTIFY_YAML)?;

    Ok(temp_dir)
}

/// Scripted server serving every script of the project at `root`.
#[allow(dead_code)]
pub fn scripted_server(root: &Path) -> Arc<ScriptedServer> {
    let config = load_config(root).expect("test configuration loads");
    Arc::new(ScriptedServer::new(config.scripts).with_user("alice", "secret"))
}

/// A standalone client wired to fresh channels.
#[allow(dead_code)]
pub struct ClientHarness {
    pub client: ProcessExecutionClient,
    pub view: ViewProbe,
    pub dispatch_rx: UnboundedReceiver<Dispatch>,
    pub events_rx: UnboundedReceiver<Event>,
}

#[allow(dead_code)]
impl ClientHarness {
    pub fn new(auto_continue: bool) -> Self {
        let (dispatch_tx, dispatch_rx) = unbounded_channel();
        let (events_tx, events_rx) = unbounded_channel();
        let view = RecordingView::new();
        let probe = view.probe();
        let client = ProcessExecutionClient::new(
            Box::new(view),
            ClientChannels {
                dispatch_tx,
                events_tx,
            },
        )
        .with_auto_continue(auto_continue);

        Self {
            client,
            view: probe,
            dispatch_rx,
            events_rx,
        }
    }

    /// Execute queued requests against `server` until none are left.
    ///
    /// Returns the number of requests executed.
    pub async fn run_until_quiet(&mut self, server: &ScriptedServer) -> usize {
        let mut executed = 0;
        while let Ok(dispatch) = self.dispatch_rx.try_recv() {
            let result = server.execute(dispatch.request).await;
            self.client
                .route(dispatch.client_id, result)
                .expect("response routes to a live client");
            executed += 1;
        }
        executed
    }

    pub fn events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// A shell over the scripted server of the project at `root`.
#[allow(dead_code)]
pub fn create_shell(root: &Path) -> (ApplicationShell, PanelProbe, Arc<ScriptedServer>) {
    let config = load_config(root).expect("test configuration loads");
    let server = Arc::new(ScriptedServer::new(config.scripts).with_user("alice", "secret"));
    let services = RemoteServiceHandle::register(server.clone());
    let panels = RecordingPanels::new();
    let probe = panels.probe();
    let shell = ApplicationShell::new(config.client, services, Box::new(panels));
    (shell, probe, server)
}
