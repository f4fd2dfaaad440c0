//! CLI-level integration tests that don't require a running Chrome
//! instance: the parse-error path exits before any transport connection
//! is attempted (spec §7 "PARSE and VALIDATION short-circuit before any
//! step runs").

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn malformed_json_input_exits_1_with_parse_error() {
    let mut cmd = Command::cargo_bin("cdp-skill").unwrap();
    cmd.arg("not json")
        .assert()
        .failure()
        .code(1)
        .stdout(contains("\"PARSE\""));
}

#[test]
fn missing_steps_field_exits_1_with_parse_error() {
    let mut cmd = Command::cargo_bin("cdp-skill").unwrap();
    cmd.arg(r#"{"tab":"t1"}"#)
        .assert()
        .failure()
        .code(1)
        .stdout(contains("\"PARSE\""));
}
