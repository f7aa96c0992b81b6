//! End-to-end checks of the `masala` binary's exit codes and stderr.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn missing_source_file_exits_with_code_one() {
    Command::cargo_bin("masala")
        .unwrap()
        .arg("does-not-exist.masala")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("IO Error"));
}

#[test]
fn a_pipeline_error_exits_with_code_two() {
    let dir = std::env::temp_dir();
    let path = dir.join("masala-cli-test-unterminated-string.masala");
    std::fs::write(&path, "action!\nek baat bataun: \"oops\npaisa vasool").unwrap();

    Command::cargo_bin("masala")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Lexer Error"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn a_well_formed_program_exits_with_code_zero_and_prints_its_output() {
    let dir = std::env::temp_dir();
    let path = dir.join("masala-cli-test-hello.masala");
    std::fs::write(&path, "action!\nek baat bataun: \"hello\"\npaisa vasool").unwrap();

    Command::cargo_bin("masala")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));

    let _ = std::fs::remove_file(&path);
}
