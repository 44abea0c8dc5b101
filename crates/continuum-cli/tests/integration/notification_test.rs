//! Integration tests for notification commands
//!
//! `NotificationService::in_memory()` backs a fresh store per `Continuum`
//! instance, so notifications never outlive the CLI process that created
//! them — every case here is scoped to a single invocation.

mod common;
use common::{assert_output_contains, assert_valid_json, TestDb};

#[test]
fn test_notification_list_empty() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("notification")
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[test]
fn test_notification_list_text_format_empty() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("notification")
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["0 notification(s)"]);
}

#[test]
fn test_notification_ack_unknown_id_fails() {
    let db = TestDb::new();

    db.cmd()
        .arg("notification")
        .arg("ack")
        .arg("00000000-0000-0000-0000-000000000000")
        .assert()
        .failure();
}

#[test]
fn test_notification_ack_invalid_uuid_fails() {
    let db = TestDb::new();

    db.cmd()
        .arg("notification")
        .arg("ack")
        .arg("not-a-uuid")
        .assert()
        .failure();
}
