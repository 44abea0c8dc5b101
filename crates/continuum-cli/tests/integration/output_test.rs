//! Integration tests for output formatting across all commands

mod common;
use common::{assert_valid_json, assert_valid_yaml, TestDb};

#[test]
fn test_stats_all_output_formats() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable");

    for format in &["text", "json", "yaml", "table"] {
        db.cmd().arg("--format").arg(format).arg("stats").assert().success();
    }
}

#[test]
fn test_search_all_output_formats() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable");

    for format in &["text", "json", "yaml", "table"] {
        db.cmd().arg("--format").arg(format).arg("search").arg("postgres").assert().success();
    }
}

#[test]
fn test_agent_summary_all_output_formats() {
    let db = TestDb::new();

    for format in &["text", "json", "yaml", "table"] {
        db.cmd().arg("--format").arg(format).arg("agent").arg("summary").assert().success();
    }
}

#[test]
fn test_agent_check_all_output_formats() {
    let db = TestDb::new();

    for format in &["text", "json", "yaml", "table"] {
        db.cmd()
            .arg("--format")
            .arg(format)
            .arg("agent")
            .arg("check")
            .arg("use postgres for the primary store")
            .assert()
            .success();
    }
}

#[test]
fn test_entity_context_all_output_formats() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable");

    for format in &["text", "json", "yaml", "table"] {
        db.cmd()
            .arg("--format")
            .arg(format)
            .arg("entity")
            .arg("context")
            .arg("PostgreSQL")
            .assert()
            .success();
    }
}

#[test]
fn test_notification_list_all_output_formats() {
    let db = TestDb::new();

    for format in &["text", "json", "yaml", "table"] {
        db.cmd().arg("--format").arg(format).arg("notification").arg("list").assert().success();
    }
}

#[test]
fn test_invalid_output_format_fails() {
    let db = TestDb::new();

    db.cmd().arg("--format").arg("invalid_format").arg("stats").assert().failure();
}

#[test]
fn test_json_format_consistency() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable");

    let commands = vec![vec!["stats"], vec!["search", "postgres"], vec!["agent", "summary"]];

    for cmd_args in commands {
        let mut cmd = db.cmd();
        cmd.arg("--format").arg("json");
        for arg in cmd_args {
            cmd.arg(arg);
        }
        let output = cmd.assert().success().get_output().stdout.clone();
        assert_valid_json(&String::from_utf8(output).unwrap());
    }
}

#[test]
fn test_yaml_format_consistency() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable");

    let commands = vec![vec!["stats"], vec!["agent", "summary"]];

    for cmd_args in commands {
        let mut cmd = db.cmd();
        cmd.arg("--format").arg("yaml");
        for arg in cmd_args {
            cmd.arg(arg);
        }
        let output = cmd.assert().success().get_output().stdout.clone();
        assert_valid_yaml(&String::from_utf8(output).unwrap());
    }
}
