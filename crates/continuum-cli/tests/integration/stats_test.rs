//! Integration tests for the stats command

mod common;
use common::{assert_output_contains, assert_valid_json, assert_valid_yaml, TestDb};

#[test]
fn test_stats_empty_database() {
    let db = TestDb::new();

    db.cmd().arg("stats").assert().success();
}

#[test]
fn test_stats_text_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("text")
        .arg("stats")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["Graph Statistics", "Decisions:", "Entities:", "Candidates:", "Commits:"]);
}

#[test]
fn test_stats_json_format_reflects_recorded_decision() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable and well understood");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("stats")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["decision_count"].as_u64().unwrap(), 1);
    assert!(json.get("entity_count").is_some());
    assert!(json.get("candidate_count").is_some());
    assert!(json.get("code_entity_count").is_some());
    assert!(json.get("commit_count").is_some());
}

#[test]
fn test_stats_yaml_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("yaml")
        .arg("stats")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let yaml = assert_valid_yaml(&String::from_utf8(output).unwrap());
    assert!(yaml.get("decision_count").is_some());
}

#[test]
fn test_stats_table_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("table")
        .arg("stats")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["Metric", "Count", "Decisions", "Entities"]);
}

#[test]
fn test_stats_multiple_decisions_bump_entity_count() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable");
    db.remember_decision("use redis for the cache layer", "fast");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("stats")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["decision_count"].as_u64().unwrap(), 2);
}
