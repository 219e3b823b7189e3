use pd_protocol::*;
use serde_json::json;

#[test]
fn test_process_script_deserialization_from_yaml() {
    let yaml_str = r#"
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
    spawn:
      - Notify
"#;

    let script: ProcessScript =
        serde_yaml::from_str(yaml_str).expect("Failed to deserialize ProcessScript");

    assert_eq!(script.name, "Checkout");
    assert_eq!(script.steps.len(), 2);
    assert!(script.steps[0].immediate_interaction);
    assert_eq!(script.steps[0].style.as_deref(), Some("form"));
    assert_eq!(script.steps[0].parameters[0].rule, Some(ParameterRule::Positive));
    assert_eq!(script.steps[0].parameters[0].default, serde_json::Value::Null);
    assert!(script.steps[1].can_rollback);
    assert!(!script.steps[1].auto_continue);
    assert_eq!(script.steps[1].spawn, vec!["Notify".to_string()]);
}

#[test]
fn test_execution_mode_serialization() {
    assert_eq!(
        serde_json::to_string(&ExecutionMode::Rollback).unwrap(),
        "\"ROLLBACK\""
    );
    let mode: ExecutionMode = serde_json::from_str("\"CANCEL\"").unwrap();
    assert_eq!(mode, ExecutionMode::Cancel);
}

#[test]
fn test_execute_process_command_serialization() {
    let descriptor = ProcessDescriptor::new("Checkout", "en-US").with_input(json!({"cart": 7}));
    let command: Command = ExecuteRequest::Start { descriptor }.into();

    let json = serde_json::to_value(&command).unwrap();
    assert_eq!(json["command"], "EXECUTE_PROCESS");
    assert_eq!(json["payload"]["type"], "start");
    assert_eq!(json["payload"]["descriptor"]["name"], "Checkout");
    assert_eq!(json["payload"]["descriptor"]["input"]["cart"], 7);

    let back: Command = serde_json::from_value(json).unwrap();
    assert_eq!(back, command);
}

#[test]
fn test_continue_request_carries_modified_markers() {
    let mut parameter = InteractionParameter::new("amount", json!(20));
    parameter.modified = true;
    let state = ProcessState::new("Checkout", "PaymentInfo").with_parameter(parameter);
    let request = ExecuteRequest::Continue {
        state,
        mode: ExecutionMode::Execute,
        event: Some(InteractionEvent::new(InteractionEventKind::FieldChanged, "amount")),
    };

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["type"], "continue");
    assert_eq!(json["mode"], "EXECUTE");
    assert_eq!(json["event"]["kind"], "fieldChanged");
    assert_eq!(json["state"]["parameters"][0]["modified"], true);
}

#[test]
fn test_process_state_defaults_from_sparse_json() {
    let id = uuid::Uuid::new_v4();
    let state: ProcessState = serde_json::from_value(json!({
        "id": id,
        "process_name": "Checkout",
        "step": "PaymentInfo"
    }))
    .unwrap();

    assert_eq!(state.id, id);
    assert!(state.parameters.is_empty());
    assert!(!state.finished);
    assert!(state.children.is_empty());
    assert_eq!(state.style(), None);
}

#[test]
fn test_service_error_serialization() {
    let error = ServiceError::recoverable("Validation failed").with_field_error("amount", "is required");

    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["kind"], "recoverable");
    assert_eq!(json["field_errors"]["amount"], "is required");

    let unrecoverable: ServiceError = serde_json::from_value(json!({
        "kind": "unrecoverable",
        "message": "Server fault"
    }))
    .unwrap();
    assert!(!unrecoverable.is_recoverable());
    assert_eq!(unrecoverable.to_string(), "Server fault");
}

#[test]
fn test_event_enum_serialization() {
    let client_id = uuid::Uuid::new_v4();
    let event = Event::ProcessFailed {
        client_id,
        parent: None,
        error: "Server fault".to_string(),
    };

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "processFailed");
    assert_eq!(json["payload"]["error"], "Server fault");
    assert_eq!(event.client_id(), client_id);
}

#[test]
fn test_client_config_defaults() {
    let config: ClientConfig = serde_json::from_value(json!({ "main_process": "Checkout" })).unwrap();

    assert_eq!(config.main_process, "Checkout");
    assert_eq!(config.locale, "en-US");
    assert!(config.auto_continue);
    assert_eq!(config.viewport, ClientConfig::default().viewport);
}
