//! Integration tests for entity commands

mod common;
use common::{assert_output_contains, assert_valid_json, TestDb};

#[test]
fn test_entity_context_not_found() {
    let db = TestDb::new();

    db.cmd()
        .arg("entity")
        .arg("context")
        .arg("nonexistent-entity")
        .assert()
        .failure();
}

#[test]
fn test_entity_context_found_via_alias_dictionary() {
    let db = TestDb::new();

    // "postgres" resolves through the default alias dictionary to the
    // canonical entity "PostgreSQL", so remembering a decision that
    // mentions it creates the entity as a side effect.
    db.remember_decision("we decided to use postgres for the primary store", "team already knows it");

    let output = db
        .cmd()
        .arg("--format")
        .arg("json")
        .arg("entity")
        .arg("context")
        .arg("PostgreSQL")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = assert_valid_json(&String::from_utf8(output).unwrap());
    assert_eq!(json["entity"]["canonical_name"].as_str().unwrap(), "PostgreSQL");
    assert!(json["involving_decisions"].as_array().unwrap().len() >= 1);
    assert!(json["subgraph_node_count"].as_u64().is_some());
    assert!(json["subgraph_edge_count"].as_u64().is_some());
}

#[test]
fn test_entity_context_text_format() {
    let db = TestDb::new();

    db.remember_decision("we decided to use postgres for the primary store", "team already knows it");

    let output = db
        .cmd()
        .arg("entity")
        .arg("context")
        .arg("postgres")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output_str = String::from_utf8(output).unwrap();
    assert_output_contains(&output_str, &["Entity: PostgreSQL", "Involving decisions:"]);
}
