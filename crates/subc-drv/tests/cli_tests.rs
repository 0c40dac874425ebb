//! CLI surface tests: flags, exit codes, diagnostics formatting.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn subc() -> Command {
    Command::cargo_bin("subc").expect("subc binary")
}

/// Write a source file into a temp dir and return its path
fn fixture(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).expect("write fixture");
    path
}

#[test]
fn no_arguments_prints_usage() {
    subc()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("usage: subc"));
}

#[test]
fn unknown_flag_rejected() {
    subc()
        .arg("-frobnicate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown flag"));
}

#[test]
fn missing_input_file_fails() {
    subc()
        .arg("does-not-exist.sb")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does-not-exist.sb"));
}

#[test]
fn emit_ir_prints_module() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "prog.sb", "var x = 10\nvar y = 20\nprint(x + y * 2)\n");
    subc()
        .arg(&input)
        .arg("-emit-ir")
        .assert()
        .success()
        .stdout(predicate::str::contains("FUNC_START main"))
        .stdout(predicate::str::contains("PRINT"))
        .stdout(predicate::str::contains("FUNC_END"));
}

#[test]
fn emit_asm_writes_s_file() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "prog.sb", "print(\"adult\")\n");
    let output = dir.path().join("prog.s");
    subc().arg(&input).arg("-S").assert().success();

    let asm = fs::read_to_string(&output).expect(".s file written next to input");
    assert!(asm.contains("main:") || asm.contains("_main:"));
    assert!(asm.contains("adult"));
}

#[test]
fn emit_asm_honors_output_flag() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "prog.sb", "print(1)\n");
    let output = dir.path().join("custom.s");
    subc()
        .arg(&input)
        .arg("-S")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    assert!(output.exists());
}

#[test]
fn assembly_output_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let source = "var a = \"x\"\nprint(a + \"y\")\nfor i in range(3) { print(i) }\n";
    let input = fixture(&dir, "prog.sb", source);
    let first = dir.path().join("first.s");
    let second = dir.path().join("second.s");

    subc().arg(&input).arg("-S").arg("-o").arg(&first).assert().success();
    subc().arg(&input).arg("-S").arg("-o").arg(&second).assert().success();

    assert_eq!(
        fs::read(&first).unwrap(),
        fs::read(&second).unwrap(),
        "same input must produce byte-identical assembly"
    );
}

#[test]
fn verbose_reports_phases() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "prog.sb", "print(1)\n");
    subc()
        .arg(&input)
        .arg("-emit-ir")
        .arg("-v")
        .assert()
        .success()
        .stderr(predicate::str::contains("subc: lexing"))
        .stderr(predicate::str::contains("subc: parsing"))
        .stderr(predicate::str::contains("subc: semantic analysis"))
        .stderr(predicate::str::contains("subc: generating ir"));
}

#[test]
fn opt_level_one_folds_constants() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "prog.sb", "print(2 + 3 * 4)\n");

    let unfolded = subc().arg(&input).arg("-emit-ir").output().unwrap();
    let folded = subc().arg(&input).arg("-emit-ir").arg("-O1").output().unwrap();
    let unfolded = String::from_utf8_lossy(&unfolded.stdout).to_string();
    let folded = String::from_utf8_lossy(&folded.stdout).to_string();

    assert!(unfolded.contains("MUL"), "expected a MUL at -O0:\n{}", unfolded);
    assert!(folded.contains("CONST_INT") && folded.contains(", 14"), "{}", folded);
    assert!(!folded.contains("MUL"), "MUL should fold at -O1:\n{}", folded);
}

// =============================================================================
// Error scenarios (each exits non-zero with a diagnostic + summary)
// =============================================================================

fn assert_semantic_error(source: &str, message: &str) {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "prog.sb", source);
    subc()
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(message))
        .stderr(predicate::str::contains("error(s)"));
}

#[test]
fn undeclared_identifier_fails() {
    assert_semantic_error("print(missing + 1)\n", "undeclared identifier `missing`");
}

#[test]
fn string_into_int_variable_fails() {
    assert_semantic_error("var x: int = \"oops\"\n", "type mismatch");
}

#[test]
fn integer_condition_fails() {
    assert_semantic_error("if 1 { print(1) }\n", "condition must be `bool`");
}

#[test]
fn bad_return_expression_fails() {
    assert_semantic_error(
        "function f(): int { return 1 + \"x\" }\n",
        "requires numeric operands",
    );
}

#[test]
fn diagnostics_carry_file_line_column() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "prog.sb", "var ok = 1\nprint(nope)\n");
    subc()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("prog.sb:2:7: error:"));
}

#[test]
fn multiple_errors_reported_in_one_run() {
    let dir = TempDir::new().unwrap();
    let input = fixture(
        &dir,
        "prog.sb",
        "print(first)\nprint(second)\nvar x: int = \"s\"\n",
    );
    subc()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("first"))
        .stderr(predicate::str::contains("second"))
        .stderr(predicate::str::contains("3 error(s)"));
}
