//! Integration tests for the `procdesk` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const CHECKOUT_YAML: &str = r#"
name: Checkout
description: Pay for the shopping cart
steps:
  - step: PaymentInfo
    immediate-interaction: true
    parameters:
      - name: amount
        label: Amount
        required: true
        rule: positive
  - step: Confirm
    can-rollback: true
"#;

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let processes = dir.path().join(".procdesk/processes");
    std::fs::create_dir_all(&processes).unwrap();
    std::fs::write(
        dir.path().join(".procdesk/config.toml"),
        "main_process = \"Checkout\"\n",
    )
    .unwrap();
    std::fs::write(processes.join("checkout.yaml"), CHECKOUT_YAML).unwrap();
    dir
}

fn procdesk(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("procdesk").unwrap();
    cmd.arg("--root").arg(root);
    cmd
}

#[test]
fn test_list_prints_processes() {
    let dir = project();
    procdesk(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checkout"))
        .stdout(predicate::str::contains("Pay for the shopping cart"));
}

#[test]
fn test_run_completes_checkout() {
    let dir = project();
    procdesk(dir.path())
        .args(["run", "--user", "alice"])
        .write_stdin("next\nset amount=20\nnext\nnext\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("== Checkout / PaymentInfo =="))
        .stdout(predicate::str::contains("ignored: AwaitingInput"))
        .stdout(predicate::str::contains("== Checkout / Confirm =="))
        .stdout(predicate::str::contains("Session closed"));
}

#[test]
fn test_run_reports_validation_errors() {
    let dir = project();
    procdesk(dir.path())
        .args(["run", "--user", "alice"])
        .write_stdin("set amount=-3\nnext\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("amount: must be positive"));
}

#[test]
fn test_run_cancel_with_confirmation() {
    let dir = project();
    procdesk(dir.path())
        .args(["run", "--user", "alice"])
        .write_stdin("set amount=5\nnext\ncancel\nyes\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancel Checkout? (yes/no)"))
        .stdout(predicate::str::contains("Session closed"));
}

#[test]
fn test_run_unknown_process_fails() {
    let dir = project();
    procdesk(dir.path())
        .args(["run", "--user", "alice", "--process", "Payroll"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown process 'Payroll'"));
}

#[test]
fn test_run_without_scripts_fails() {
    let dir = tempfile::tempdir().unwrap();
    procdesk(dir.path())
        .args(["run", "--user", "alice"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no process scripts found"));
}

#[test]
fn test_usage_error_exits_with_one() {
    Command::cargo_bin("procdesk")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("frobnicate"));
}

#[test]
fn test_help_prints_usage_and_succeeds() {
    Command::cargo_bin("procdesk")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}
