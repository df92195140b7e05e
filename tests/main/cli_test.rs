//! CLI contract tests.

use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("marvin").expect("binary should build");
    let assert = cmd.arg("--help").assert().success();

    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("start"));
    assert!(stdout.contains("link"));
}

#[test]
fn version_flag_prints_version() {
    let mut cmd = Command::cargo_bin("marvin").expect("binary should build");
    let assert = cmd.arg("--version").assert().success();

    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("marvin").expect("binary should build");
    cmd.arg("frobnicate").assert().failure();
}
