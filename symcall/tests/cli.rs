//!
//! CLI Integration Tests
//!
//! Spawns the `symcall` binary via `env!("CARGO_BIN_EXE_symcall")` and
//! checks stdout, stderr and exit codes. Native symbols come from libc as
//! linked into the binary, so these only run on glibc Linux.
//!

#![cfg(all(target_os = "linux", target_env = "gnu"))]

use std::path::PathBuf;
use std::process::{Command, Output};

fn symcall(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_symcall"))
        .args(args)
        .env_remove("SYMCALL_LOG")
        .output()
        .expect("failed to run symcall")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn fixture_path(name: &str) -> String {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("tests");
    p.push("fixtures");
    p.push(format!("{}.sym", name));
    p.to_string_lossy().into_owned()
}

#[test]
fn test_call_strlen() {
    let output = symcall(&["call", "strlen", "hello"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "5\n");
}

#[test]
fn test_call_with_negative_literal() {
    let output = symcall(&["call", "labs", "-42"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "42\n");
}

#[test]
fn test_call_unknown_function_fails() {
    let output = symcall(&["call", "nonexistent_fn_for_cli_test"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not found"), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_get_unknown_variable_fails() {
    let output = symcall(&["get", "nonexistent_var_for_cli_test"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("symbol _nonexistent_var_for_cli_test not found"));
}

#[test]
fn test_run_libc_script() {
    let output = symcall(&["run", &fixture_path("libc_string")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "length\t14\n");
}

#[test]
fn test_run_reports_script_errors() {
    let output = symcall(&["run", &fixture_path("unknown_function")]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("runtime error at 2:1"), "stderr: {}", err);
    assert!(err.contains("frobnicate"), "stderr: {}", err);
}

#[test]
fn test_run_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("broken.sym");
    std::fs::write(&script, "print(1, 2\n").unwrap();

    let output = symcall(&["run", &script.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("parse error at"), "stderr: {}", stderr(&output));
}

#[test]
fn test_script_level_miss_is_advisory() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("miss.sym");
    std::fs::write(&script, "print(call(\"nonexistent_fn_for_cli_test\"))\nprint(\"still running\")\n").unwrap();

    let output = symcall(&["run", &script.to_string_lossy()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "nil\nstill running\n");
    assert!(stderr(&output).contains("Error: function _nonexistent_fn_for_cli_test not found"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("symcall.toml");
    std::fs::write(&config, "max_args = 99\n").unwrap();

    let output = symcall(&["--config", &config.to_string_lossy(), "call", "strlen", "x"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("max_args must be between 0 and 15, got 99"));
}

#[test]
fn test_config_decorated_first() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("symcall.toml");
    std::fs::write(&config, "lookup_order = \"decorated-first\"\ndecoration = \"_\"\n").unwrap();

    let output = symcall(&["-vv", "--config", &config.to_string_lossy(), "call", "strlen", "abc"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "3\n");

    let err = stderr(&output);
    let decorated_miss = err.find("symbol=_strlen").expect("decorated spelling tried");
    let resolved = err.find("symbol resolved").expect("plain spelling resolved");
    assert!(decorated_miss < resolved, "stderr: {}", err);
}

#[test]
fn test_default_order_resolves_plain_spelling_first() {
    let output = symcall(&["-vv", "call", "strlen", "abc"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("symbol resolved"), "stderr: {}", err);
    assert!(!err.contains("symbol=_strlen"), "stderr: {}", err);
}

#[test]
fn test_set_global_without_value_is_advisory() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("set.sym");
    std::fs::write(&script, "setGlobal(\"some_counter\")\nvxSet(\"some_counter\")\nprint(\"done\")\n").unwrap();

    let output = symcall(&["run", &script.to_string_lossy()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "done\n");
    assert_eq!(stderr(&output).matches("Error: missing value").count(), 2, "stderr: {}", stderr(&output));
}

#[test]
fn test_verbose_logs_marshalling() {
    let output = symcall(&["-vv", "call", "strlen", "hi"]);
    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("invoking"), "stderr: {}", err);
    assert!(err.contains("argument"), "stderr: {}", err);
}
