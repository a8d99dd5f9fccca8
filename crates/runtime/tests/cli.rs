//! Runs the `tablebridge` binary against a fixture file.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const FIXTURE: &str = "\
tables:
  - name: repos
    description: Repositories
    columns:
      - { name: name, type: string }
      - { name: stars, type: int }
      - { name: archived, type: bool }
    key_columns: { single: name }
    rows:
      - { name: alpha, stars: 12, archived: false }
      - { name: beta, stars: 3, archived: true }
      - { name: gamma, stars: 40, archived: false }
";

fn fixture() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("create fixture");
    file.write_all(FIXTURE.as_bytes()).expect("write fixture");
    file
}

fn tablebridge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tablebridge"))
        .args(["--config", "/nonexistent/tablebridge.yaml"])
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("run tablebridge")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn describe_lists_fixture_tables() {
    let fixture = fixture();
    let output = tablebridge(&["describe", "--fixtures", fixture.path().to_str().unwrap()]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["plugin"]["name"], "tablebridge");
    assert_eq!(json["actions"][0]["name"], "repos");
    assert_eq!(json["actions"][0]["output"]["fields"][2]["type"], "bool");
}

#[test]
fn execute_filters_rows() {
    let fixture = fixture();
    let output = tablebridge(&[
        "execute",
        "--fixtures",
        fixture.path().to_str().unwrap(),
        "--table",
        "repos",
        "--query-ctx",
        r#"{"constraints":{"stars":{"constraints":[{"operator":4,"expression":"10"}]}}}"#,
    ]);

    assert!(output.status.success());
    let rows = stdout_json(&output)["rows"].as_array().cloned().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "alpha");
    assert_eq!(rows[0]["archived"], "false");
}

#[test]
fn truncated_result_exits_with_partial_failure() {
    let fixture = fixture();
    let output = tablebridge(&[
        "execute",
        "--fixtures",
        fixture.path().to_str().unwrap(),
        "--table",
        "repos",
        "--query-ctx",
        r#"{"maxRows": 1}"#,
    ]);

    assert_eq!(output.status.code(), Some(8));
    let json = stdout_json(&output);
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(1));
    assert!(json["error_message"]
        .as_str()
        .unwrap()
        .contains("limit of rows reached"));
}

#[test]
fn unknown_table_exits_with_query_error() {
    let fixture = fixture();
    let output = tablebridge(&[
        "execute",
        "--fixtures",
        fixture.path().to_str().unwrap(),
        "--table",
        "repo",
    ]);

    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BRIDGE-2001"));
    assert!(stderr.contains("Did you mean 'repos'?"));
}

#[test]
fn test_credentials_reports_missing_fields() {
    let output = tablebridge(&[
        "test-credentials",
        "--connections",
        r#"{"github": {"id": "1", "name": "gh", "data": {}}}"#,
        "--require",
        "github.token",
    ]);

    assert_eq!(output.status.code(), Some(7));
    let json = stdout_json(&output);
    assert_eq!(json["are_credentials_valid"], false);
    assert_eq!(json["raw_validation_response"], "missing credentials: github.token");
}
