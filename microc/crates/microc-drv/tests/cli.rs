//! End-to-end tests for the `microc` binary: invoke it as a subprocess and
//! check exit status, diagnostics on stderr, and the emitted `.s` file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn microc() -> Command {
    Command::cargo_bin("microc").unwrap()
}

#[test]
fn help_lists_the_compile_subcommand() {
    microc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compile"));
}

#[test]
fn version_flag_prints_the_crate_version() {
    microc()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn compiling_a_well_typed_file_writes_assembly() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("add.mc");
    fs::write(&input, "int add(int a, int b) { return a + b; }").unwrap();

    microc()
        .arg("compile")
        .arg(&input)
        .arg("--emit-asm")
        .arg(dir.path())
        .assert()
        .success();

    let asm = fs::read_to_string(dir.path().join("add.s")).unwrap();
    assert!(asm.contains("add:"));
}

#[test]
fn compiling_an_ill_typed_file_fails_and_reports_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.mc");
    fs::write(&input, "int f() { return undeclared_name; }").unwrap();

    microc()
        .arg("compile")
        .arg(&input)
        .arg("--emit-asm")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("undefined symbol"));

    assert!(!dir.path().join("bad.s").exists());
}

#[test]
fn missing_input_file_is_a_usage_error() {
    microc().arg("compile").assert().failure();
}
