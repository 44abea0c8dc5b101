//! Integration tests for decision commands

use assert_cmd::Command;

mod common;
use common::{assert_output_contains, assert_valid_json, assert_valid_yaml, TestDb};

#[test]
fn test_decision_remember_text_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("decision")
        .arg("remember")
        .arg("--trigger")
        .arg("choosing a primary datastore")
        .arg("--context")
        .arg("need durable storage for the graph")
        .arg("--decision")
        .arg("use postgres")
        .arg("--rationale")
        .arg("team already operates it")
        .arg("--option")
        .arg("use postgres")
        .arg("--option")
        .arg("use sqlite")
        .arg("--scope")
        .arg("architectural")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["Decision recorded:", "use postgres"]);
}

#[test]
fn test_decision_remember_json_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("decision")
        .arg("remember")
        .arg("--trigger")
        .arg("a trigger")
        .arg("--context")
        .arg("a context")
        .arg("--decision")
        .arg("use postgres")
        .arg("--rationale")
        .arg("a rationale")
        .arg("--option")
        .arg("use postgres")
        .arg("--scope")
        .arg("tactical")
        .arg("--confidence")
        .arg("0.8")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert!(json["id"].as_str().is_some());
    assert_eq!(json["agent_decision"].as_str().unwrap(), "use postgres");
    assert_eq!(json["scope"].as_str().unwrap(), "tactical");
}

#[test]
fn test_decision_remember_yaml_format() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("yaml")
        .arg("decision")
        .arg("remember")
        .arg("--trigger")
        .arg("a trigger")
        .arg("--context")
        .arg("a context")
        .arg("--decision")
        .arg("use postgres")
        .arg("--rationale")
        .arg("a rationale")
        .arg("--option")
        .arg("use postgres")
        .arg("--scope")
        .arg("tactical")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let yaml = assert_valid_yaml(&String::from_utf8(output).unwrap());
    assert!(yaml.get("id").is_some());
}

#[test]
fn test_decision_remember_with_project_and_files() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("decision")
        .arg("remember")
        .arg("--project")
        .arg("continuum")
        .arg("--trigger")
        .arg("a trigger")
        .arg("--context")
        .arg("a context")
        .arg("--decision")
        .arg("use postgres")
        .arg("--rationale")
        .arg("a rationale")
        .arg("--option")
        .arg("use postgres")
        .arg("--file")
        .arg("src/storage/mod.rs")
        .arg("--scope")
        .arg("tactical")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["project"].as_str().unwrap(), "continuum");
}

#[test]
fn test_decision_remember_defaults_to_unknown_scope() {
    let db = TestDb::new();

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("decision")
        .arg("remember")
        .arg("--trigger")
        .arg("a trigger")
        .arg("--context")
        .arg("a context")
        .arg("--decision")
        .arg("use postgres")
        .arg("--rationale")
        .arg("a rationale")
        .arg("--option")
        .arg("use postgres")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["scope"].as_str().unwrap(), "unknown");
}

#[test]
fn test_decision_ingest_missing_file_fails() {
    let db = TestDb::new();

    db.cmd()
        .arg("decision")
        .arg("ingest")
        .arg("--project")
        .arg("continuum")
        .arg("--input")
        .arg(db.tempdir.path().join("does-not-exist.jsonl"))
        .assert()
        .failure();
}

#[test]
fn test_decision_remember_missing_required_arg_fails() {
    let db = TestDb::new();

    db.cmd()
        .arg("decision")
        .arg("remember")
        .arg("--trigger")
        .arg("a trigger")
        .assert()
        .failure();
}
