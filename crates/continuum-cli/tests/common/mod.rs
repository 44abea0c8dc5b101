//! Common test utilities for CLI integration tests
//!
//! Fixtures are seeded by driving the compiled binary itself (`decision
//! remember` over the same `sled` path the later assertions read from),
//! the same way the teacher's suite drives `AsyncMemoryGraph` through its
//! own binary instead of poking storage internals directly.

use assert_cmd::Command;
use tempfile::TempDir;

/// Temp `sled` directory plus the `continuum` binary args needed to point
/// at it. Every CLI invocation in a test gets its own process, so
/// anything that must survive across commands (decisions, entities) has
/// to be persisted to disk — notifications, which `Continuum` keeps
/// in-memory per process, do not survive across invocations here.
pub struct TestDb {
    pub tempdir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let tempdir = TempDir::new().expect("failed to create temp dir");
        Self { tempdir }
    }

    pub fn path_str(&self) -> &str {
        self.tempdir.path().to_str().unwrap()
    }

    /// Build a `continuum` command pre-armed with `--db-path`.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("continuum").unwrap();
        cmd.arg("--db-path").arg(self.path_str());
        cmd
    }

    /// Record a decision via `decision remember` and return its id (the
    /// CLI prints it with `--format json`).
    pub fn remember_decision(&self, decision_text: &str, rationale: &str) -> String {
        let output = self
            .cmd()
            .arg("--format")
            .arg("json")
            .arg("decision")
            .arg("remember")
            .arg("--trigger")
            .arg("a test trigger")
            .arg("--context")
            .arg("a test context")
            .arg("--decision")
            .arg(decision_text)
            .arg("--rationale")
            .arg(rationale)
            .arg("--option")
            .arg(decision_text)
            .arg("--scope")
            .arg("tactical")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let json = assert_valid_json(&String::from_utf8(output).unwrap());
        json["id"].as_str().unwrap().to_string()
    }
}

/// Assert that output contains all expected strings
pub fn assert_output_contains(output: &str, expected: &[&str]) {
    for exp in expected {
        assert!(output.contains(exp), "Output should contain '{}'\nActual output:\n{}", exp, output);
    }
}

/// Assert that output is valid JSON
pub fn assert_valid_json(output: &str) -> serde_json::Value {
    serde_json::from_str(output).expect("Output should be valid JSON")
}

/// Assert that output is valid YAML
pub fn assert_valid_yaml(output: &str) -> serde_yaml::Value {
    serde_yaml::from_str(output).expect("Output should be valid YAML")
}
