//! Integration tests for the search command

mod common;
use common::{assert_output_contains, assert_valid_json, assert_valid_yaml, TestDb};

#[test]
fn test_search_finds_lexical_match() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable and well understood");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("search")
        .arg("postgres")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["query"].as_str().unwrap(), "postgres");
    assert!(json["count"].as_u64().unwrap() >= 1);
    assert!(json["results"].as_array().unwrap().iter().any(|r| r["decision"]["agent_decision"]
        .as_str()
        .unwrap()
        .contains("postgres")));
}

#[test]
fn test_search_no_match_returns_empty() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable and well understood");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("search")
        .arg("something completely unrelated to anything stored")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["count"].as_u64().unwrap(), 0);
}

#[test]
fn test_search_respects_limit() {
    let db = TestDb::new();
    for i in 0..5 {
        db.remember_decision(&format!("use redis for cache layer {i}"), "fast enough for our needs");
    }

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("search")
        .arg("redis")
        .arg("--limit")
        .arg("2")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert!(json["count"].as_u64().unwrap() <= 2);
}

#[test]
fn test_search_text_format() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable and well understood");

    let output = db
        .cmd()
        .arg("search")
        .arg("postgres")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["result(s) for \"postgres\"", "use postgres"]);
}

#[test]
fn test_search_yaml_format() {
    let db = TestDb::new();
    db.remember_decision("use postgres for the primary store", "durable and well understood");

    let output = db
        .cmd()
        .arg("--format")
        .arg("yaml")
        .arg("search")
        .arg("postgres")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let yaml = assert_valid_yaml(&String::from_utf8(output).unwrap());
    assert!(yaml.get("results").is_some());
}
