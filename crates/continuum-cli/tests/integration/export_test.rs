//! Integration tests for the export command

mod common;
use common::{assert_valid_json, TestDb};

#[test]
fn test_export_writes_markdown_log() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable and well understood");

    let output_dir = db.tempdir.path().join("export-out");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("export")
        .arg("--output-dir")
        .arg(&output_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["status"].as_str().unwrap(), "success");
    assert_eq!(json["decision_count"].as_u64().unwrap(), 1);

    let written = std::path::PathBuf::from(json["output_file"].as_str().unwrap());
    assert!(written.exists());
    let contents = std::fs::read_to_string(&written).unwrap();
    assert!(contents.contains("use postgres for the primary store"));
}

#[test]
fn test_export_filters_by_project() {
    let db = TestDb::new();

    db.cmd()
        .arg("--format")
        .arg("json")
        .arg("decision")
        .arg("remember")
        .arg("--project")
        .arg("project-a")
        .arg("--trigger")
        .arg("t")
        .arg("--context")
        .arg("c")
        .arg("--decision")
        .arg("use postgres")
        .arg("--rationale")
        .arg("r")
        .arg("--option")
        .arg("use postgres")
        .assert()
        .success();

    db.cmd()
        .arg("--format")
        .arg("json")
        .arg("decision")
        .arg("remember")
        .arg("--project")
        .arg("project-b")
        .arg("--trigger")
        .arg("t")
        .arg("--context")
        .arg("c")
        .arg("--decision")
        .arg("use redis")
        .arg("--rationale")
        .arg("r")
        .arg("--option")
        .arg("use redis")
        .assert()
        .success();

    let output_dir = db.tempdir.path().join("export-out");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("export")
        .arg("--project")
        .arg("project-a")
        .arg("--output-dir")
        .arg(&output_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["decision_count"].as_u64().unwrap(), 1);
}

#[test]
fn test_export_empty_database() {
    let db = TestDb::new();
    let output_dir = db.tempdir.path().join("export-out");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("export")
        .arg("--output-dir")
        .arg(&output_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["decision_count"].as_u64().unwrap(), 0);
}
