//! Integration tests for agent-facing commands (`summary`, `check`)

mod common;
use common::{assert_output_contains, assert_valid_json, assert_valid_yaml, TestDb};

#[test]
fn test_agent_summary_empty_database() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("agent")
        .arg("summary")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["stats"]["decision_count"].as_u64().unwrap(), 0);
    assert_eq!(json["dormant_alternatives"].as_array().unwrap().len(), 0);
    assert_eq!(json["stale_decisions"].as_array().unwrap().len(), 0);
}

#[test]
fn test_agent_summary_reflects_recorded_decisions() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable and well understood");
    db.remember_decision("use redis for the cache layer", "fast enough for our needs");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("agent")
        .arg("summary")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["stats"]["decision_count"].as_u64().unwrap(), 2);
}

#[test]
fn test_agent_summary_table_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("table")
        .arg("agent")
        .arg("summary")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["Decisions", "Dormant alternatives", "Stale decisions"]);
}

#[test]
fn test_agent_summary_yaml_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("yaml")
        .arg("agent")
        .arg("summary")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let yaml = assert_valid_yaml(&String::from_utf8(output).unwrap());
    assert!(yaml.get("stats").is_some());
}

#[test]
fn test_agent_check_proceeds_with_no_prior_decisions() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("agent")
        .arg("check")
        .arg("use postgres for the primary store")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["verdict"].as_str().unwrap(), "proceed");
}

#[test]
fn test_agent_check_text_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("agent")
        .arg("check")
        .arg("use postgres for the primary store")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["safe to proceed"]);
}
