//! End-to-end execution tests.
//!
//! Each scenario compiles a program to a native executable, runs it,
//! and compares stdout exactly. The tests skip themselves when no C
//! compiler driver is available to assemble and link.

use assert_cmd::Command;
use std::fs;
use std::process::Command as StdCommand;
use tempfile::TempDir;

fn subc() -> Command {
    Command::cargo_bin("subc").expect("subc binary")
}

/// Compile `source`, execute the result, and return its stdout.
/// Returns `None` (skipping the scenario) when `cc` is unavailable.
fn compile_and_run(source: &str) -> Option<String> {
    if !subc_gen::have_cc() {
        eprintln!("skipping execution test: no `cc` on PATH");
        return None;
    }

    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("prog.sb");
    let output = dir.path().join("prog");
    fs::write(&input, source).expect("write source");

    subc()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let run = StdCommand::new(&output).output().expect("run executable");
    assert!(
        run.status.success(),
        "executable exited with {:?}; stderr: {}",
        run.status,
        String::from_utf8_lossy(&run.stderr)
    );
    Some(String::from_utf8_lossy(&run.stdout).to_string())
}

fn assert_program_prints(source: &str, expected: &str) {
    if let Some(stdout) = compile_and_run(source) {
        assert_eq!(stdout, expected, "program: {}", source);
    }
}

#[test]
fn scenario_integer_arithmetic_and_print() {
    assert_program_prints("var x = 10\nvar y = 20\nprint(x + y * 2)\n", "50\n");
}

#[test]
fn scenario_if_else_with_comparison() {
    assert_program_prints(
        "var age = 18\nif age >= 18 { print(\"adult\") } else { print(\"minor\") } end\n",
        "adult\n",
    );
}

#[test]
fn scenario_while_loop_with_mutation() {
    assert_program_prints(
        "var n = 3\nwhile n > 0 { print(n); n = n - 1 } end\n",
        "3\n2\n1\n",
    );
}

#[test]
fn scenario_for_range_with_accumulator() {
    assert_program_prints(
        "var s = 0\nfor i in range(5) { s = s + i } end\nprint(s)\n",
        "10\n",
    );
}

#[test]
fn scenario_string_concatenation() {
    assert_program_prints(
        "var a = \"Hello, \"\nvar b = \"World\"\nprint(a + b)\n",
        "Hello, World\n",
    );
}

#[test]
fn scenario_array_literal_assign_readback() {
    assert_program_prints(
        "var arr = [1, 2, 3]\narr[1] = 10\nprint(arr[0])\nprint(arr[1])\nprint(arr[2])\n",
        "1\n10\n3\n",
    );
}

// =============================================================================
// Beyond the six core scenarios
// =============================================================================

#[test]
fn function_calls_and_recursion() {
    assert_program_prints(
        "function fib(n: int): int {\n\
         if n < 2 { return n }\n\
         return fib(n - 1) + fib(n - 2)\n\
         }\n\
         print(fib(10))\n",
        "55\n",
    );
}

#[test]
fn float_arithmetic_prints_correctly() {
    assert_program_prints("print(1.5 + 2.25)\n", "3.75\n");
}

#[test]
fn bool_printing() {
    assert_program_prints("print(1 < 2)\nprint(2 < 1)\n", "true\nfalse\n");
}

#[test]
fn short_circuit_evaluation_order() {
    // The right-hand call must not run when the left side decides
    assert_program_prints(
        "function loud(): bool { print(\"ran\")\nreturn true }\n\
         var a = false && loud()\n\
         var b = true || loud()\n\
         print(a)\nprint(b)\n",
        "false\ntrue\n",
    );
}

#[test]
fn concatenation_of_mixed_types() {
    assert_program_prints(
        "var n = 7\nprint(\"n = \" + n)\nprint(\"f = \" + 2.5)\nprint(\"b = \" + true)\n",
        "n = 7\nf = 2.5\nb = true\n",
    );
}

#[test]
fn do_while_runs_body_at_least_once() {
    assert_program_prints("var n = 10\ndo { print(n) } while n < 5\n", "10\n");
}

#[test]
fn for_over_array_collection() {
    assert_program_prints(
        "var items = [4, 5, 6]\nfor x in items { print(x) }\n",
        "4\n5\n6\n",
    );
}

#[test]
fn break_and_continue() {
    assert_program_prints(
        "for i in range(10) {\n\
         if i == 2 { continue }\n\
         if i == 5 { break }\n\
         print(i)\n\
         }\n",
        "0\n1\n3\n4\n",
    );
}

#[test]
fn string_indexing_yields_single_character() {
    assert_program_prints("var s = \"abc\"\nprint(s[1])\n", "b\n");
}

#[test]
fn ternary_selects_branch() {
    assert_program_prints(
        "var age = 20\nprint(age >= 18 ? \"adult\" : \"minor\")\n",
        "adult\n",
    );
}

#[test]
fn elif_chain() {
    assert_program_prints(
        "function classify(n: int): string {\n\
         if n < 0 { return \"neg\" } elif n == 0 { return \"zero\" } else { return \"pos\" }\n\
         }\n\
         print(classify(0 - 5))\nprint(classify(0))\nprint(classify(9))\n",
        "neg\nzero\npos\n",
    );
}

#[test]
fn exit_code_comes_from_main_return() {
    if !subc_gen::have_cc() {
        eprintln!("skipping execution test: no `cc` on PATH");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prog.sb");
    let output = dir.path().join("prog");
    fs::write(&input, "return 3\n").unwrap();

    subc().arg(&input).arg("-o").arg(&output).assert().success();
    let run = StdCommand::new(&output).output().unwrap();
    assert_eq!(run.status.code(), Some(3));
}

#[test]
fn optimization_levels_agree_on_output() {
    let source = "var x = 2 + 3 * 4\nprint(x)\nprint(10 / 3)\nprint(1.5 * 2.0)\n";
    let baseline = compile_and_run(source);
    let Some(baseline) = baseline else { return };

    if !subc_gen::have_cc() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prog.sb");
    fs::write(&input, source).unwrap();
    for level in ["-O1", "-O2", "-O3"] {
        let output = dir.path().join(format!("prog{}", level.trim_start_matches('-')));
        subc()
            .arg(&input)
            .arg(level)
            .arg("-o")
            .arg(&output)
            .assert()
            .success();
        let run = StdCommand::new(&output).output().unwrap();
        assert_eq!(
            String::from_utf8_lossy(&run.stdout),
            baseline,
            "output diverged at {}",
            level
        );
    }
}
