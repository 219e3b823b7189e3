//! Integration tests for the application shell.

mod common;

use common::{create_shell, create_test_project};
use pd_core::client::ActionOutcome;
use pd_core::services::{Capability, RemoteServiceHandle, ServiceStub};
use pd_core::shell::panels::{LOGIN_PANEL, TOOLBAR_PANEL};
use pd_core::shell::{ApplicationShell, ShellAction, ShellError, ShellPhase};
use pd_core::ui::recording::RecordingPanels;
use pd_protocol::config_models::ClientConfig;
use pd_protocol::session_models::Credentials;
use serde_json::json;
use std::sync::Arc;

fn alice() -> Credentials {
    Credentials::new("alice", "secret")
}

fn amount(value: serde_json::Value) -> ShellAction {
    ShellAction::Submit {
        name: "amount".to_string(),
        value,
    }
}

#[tokio::test]
async fn test_login_starts_main_process() {
    let project = create_test_project().unwrap();
    let (mut shell, panels, _server) = create_shell(project.path());
    assert_eq!(shell.phase(), ShellPhase::LoggedOut);
    assert!(!panels.items(LOGIN_PANEL).is_empty());

    shell.login(alice()).await.unwrap();

    assert_eq!(shell.phase(), ShellPhase::Active);
    assert_eq!(shell.user().map(|u| u.user_id), Some("alice".to_string()));
    assert!(panels.items(LOGIN_PANEL).is_empty());

    let views = panels.process_views();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].0, "Checkout");
    assert_eq!(views[0].1.step(), Some("PaymentInfo".to_string()));

    assert_eq!(panels.button_enabled(TOOLBAR_PANEL, "next"), Some(false));
    assert_eq!(panels.button_enabled(TOOLBAR_PANEL, "cancel"), Some(true));
    assert_eq!(shell.root().snapshot_count(), 1);
    assert_eq!(shell.last_user().await.unwrap(), Some("alice".to_string()));
}

#[tokio::test]
async fn test_rejected_login_stays_logged_out() {
    let project = create_test_project().unwrap();
    let (mut shell, panels, _server) = create_shell(project.path());

    let err = shell
        .login(Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ShellError::Service(_)));
    assert_eq!(shell.phase(), ShellPhase::LoggedOut);
    assert!(shell.client().is_none());
    assert!(panels
        .labels(LOGIN_PANEL)
        .contains(&"Invalid user name or password".to_string()));
}

#[tokio::test]
async fn test_finishing_main_process_returns_to_login() {
    let project = create_test_project().unwrap();
    let (mut shell, panels, server) = create_shell(project.path());
    shell.login(alice()).await.unwrap();

    assert_eq!(shell.handle_action(amount(json!(20))).await.unwrap(), ActionOutcome::Sent);
    assert_eq!(panels.button_enabled(TOOLBAR_PANEL, "previous"), Some(true));

    shell.handle_action(ShellAction::Next).await.unwrap();

    assert_eq!(shell.phase(), ShellPhase::LoggedOut);
    assert!(shell.user().is_none());
    assert!(shell.client().is_none());
    assert_eq!(shell.root().snapshot_count(), 0);
    assert!(panels.items(TOOLBAR_PANEL).is_empty());
    assert!(!panels.items(LOGIN_PANEL).is_empty());
    assert_eq!(server.running_instances().await, 0);

    // A new session can start right away.
    shell.login(alice()).await.unwrap();
    assert_eq!(shell.phase(), ShellPhase::Active);
    assert_eq!(panels.process_views().len(), 2);
}

#[tokio::test]
async fn test_cancel_asks_before_cancelling() {
    let project = create_test_project().unwrap();
    let (mut shell, panels, _server) = create_shell(project.path());
    shell.login(alice()).await.unwrap();
    shell.handle_action(amount(json!(20))).await.unwrap();

    assert_eq!(
        shell.handle_action(ShellAction::Cancel).await.unwrap(),
        ActionOutcome::AwaitingConfirmation
    );
    assert_eq!(panels.button_enabled(TOOLBAR_PANEL, "cancel"), Some(false));
    let view = panels.last_process_view().unwrap();
    assert_eq!(view.confirmations().len(), 1);

    shell.handle_action(ShellAction::Confirm(false)).await.unwrap();
    assert_eq!(shell.phase(), ShellPhase::Active);

    shell.handle_action(ShellAction::Cancel).await.unwrap();
    assert_eq!(
        shell.handle_action(ShellAction::Confirm(true)).await.unwrap(),
        ActionOutcome::Sent
    );
    assert_eq!(shell.phase(), ShellPhase::LoggedOut);
}

#[tokio::test]
async fn test_validation_errors_are_shown_on_the_field() {
    let project = create_test_project().unwrap();
    let (mut shell, panels, _server) = create_shell(project.path());
    shell.login(alice()).await.unwrap();

    shell.handle_action(amount(json!("ten"))).await.unwrap();

    let view = panels.last_process_view().unwrap();
    assert_eq!(
        view.field("amount").and_then(|f| f.error),
        Some("must be a number".to_string())
    );
    assert_eq!(view.rebuilds(), 1);
    assert_eq!(shell.phase(), ShellPhase::Active);
}

#[tokio::test]
async fn test_failed_main_process_requires_logout() {
    let project = create_test_project().unwrap();
    let (mut shell, _panels, server) = create_shell(project.path());
    shell.login(alice()).await.unwrap();

    server
        .fail_next(pd_protocol::error_models::ServiceError::unrecoverable(
            "Session expired",
        ))
        .await;
    shell.handle_action(ShellAction::Reload).await.unwrap();

    assert_eq!(shell.phase(), ShellPhase::Failed);
    assert_eq!(shell.messages(), vec!["Session expired".to_string()]);
    assert!(matches!(
        shell.handle_action(ShellAction::Next).await,
        Err(ShellError::Client(_))
    ));

    shell.handle_action(ShellAction::Logout).await.unwrap();
    assert_eq!(shell.phase(), ShellPhase::LoggedOut);
}

#[tokio::test]
async fn test_child_process_finish_is_reported_as_message() {
    let project = create_test_project().unwrap();
    std::fs::write(
        project.path().join(".procdesk/config.toml"),
        "main_process = \"Order\"\n",
    )
    .unwrap();
    let (mut shell, _panels, _server) = create_shell(project.path());

    shell.login(alice()).await.unwrap();

    assert_eq!(shell.phase(), ShellPhase::Active);
    assert_eq!(shell.messages(), vec!["Notify finished".to_string()]);
    assert!(shell.client().unwrap().children().is_empty());
}

#[tokio::test]
async fn test_actions_require_a_session() {
    let project = create_test_project().unwrap();
    let (mut shell, _panels, _server) = create_shell(project.path());

    assert!(matches!(
        shell.handle_action(ShellAction::Next).await,
        Err(ShellError::NoActiveProcess)
    ));
    assert!(matches!(shell.logout().await, Err(ShellError::NotLoggedIn)));
}

struct Empty;

impl ServiceStub for Empty {}

#[tokio::test]
async fn test_login_without_auth_capability() {
    let services = RemoteServiceHandle::register(Arc::new(Empty));
    let mut shell = ApplicationShell::new(
        ClientConfig::default(),
        services,
        Box::new(RecordingPanels::new()),
    );

    let err = shell.login(alice()).await.unwrap_err();
    assert!(matches!(
        err,
        ShellError::MissingCapability(Capability::Authentication)
    ));
    assert!(matches!(
        shell.last_user().await,
        Err(ShellError::MissingCapability(Capability::Storage))
    ));
}
