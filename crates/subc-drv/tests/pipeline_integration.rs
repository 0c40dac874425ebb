//! Library-level pipeline tests (no subprocess, no toolchain).

use std::fs;
use subc_drv::{Config, EmitKind, Session};
use tempfile::TempDir;

fn config_for(dir: &TempDir, source: &str, emit: EmitKind) -> Config {
    let input = dir.path().join("prog.sb");
    fs::write(&input, source).expect("write source");
    Config {
        input,
        output: Some(dir.path().join("out")),
        emit,
        opt_level: 0,
        verbose: false,
    }
}

#[test]
fn pipeline_reaches_assembly_for_every_scenario() {
    let scenarios = [
        "var x = 10\nvar y = 20\nprint(x + y * 2)\n",
        "var age = 18\nif age >= 18 { print(\"adult\") } else { print(\"minor\") } end\n",
        "var n = 3\nwhile n > 0 { print(n); n = n - 1 } end\n",
        "var s = 0\nfor i in range(5) { s = s + i } end\nprint(s)\n",
        "var a = \"Hello, \"\nvar b = \"World\"\nprint(a + b)\n",
        "var arr = [1, 2, 3]\narr[1] = 10\nprint(arr[0])\nprint(arr[1])\nprint(arr[2])\n",
    ];

    for source in scenarios {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir, source, EmitKind::Asm);
        config.output = Some(dir.path().join("out.s"));
        let mut session = Session::new(config);
        session
            .compile()
            .unwrap_or_else(|error| panic!("pipeline failed for {:?}: {}", source, error));

        let asm = fs::read_to_string(dir.path().join("out.s")).unwrap();
        assert!(asm.contains("main"), "no entry point for {:?}", source);
        assert!(!session.handler.has_errors());
    }
}

#[test]
fn semantic_errors_stop_before_lowering() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "var x: int = \"s\"\n", EmitKind::Asm);
    let mut session = Session::new(config);
    let error = session.compile().unwrap_err();
    assert!(matches!(
        error,
        subc_drv::CompileError::CompilationFailed { errors: 1 }
    ));
    // Nothing was written
    assert!(!dir.path().join("out").exists());
}

#[test]
fn warnings_do_not_fail_the_build() {
    // No warning-producing constructs exist yet in the front end; a
    // clean program must simply succeed with zero counts
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "print(1)\n", EmitKind::Ir);
    let mut session = Session::new(config);
    session.compile().unwrap();
    assert_eq!(session.handler.warning_count(), 0);
    assert_eq!(session.handler.error_count(), 0);
}

#[test]
fn fresh_sessions_are_independent() {
    // Two compilations of different programs must not share counters
    // or diagnostics (the handler travels with the session)
    let dir = TempDir::new().unwrap();

    let config = config_for(&dir, "print(broken)\n", EmitKind::Ir);
    let mut bad = Session::new(config);
    assert!(bad.compile().is_err());
    assert!(bad.handler.has_errors());

    let dir2 = TempDir::new().unwrap();
    let config = config_for(&dir2, "print(1)\n", EmitKind::Ir);
    let mut good = Session::new(config);
    good.compile().unwrap();
    assert!(!good.handler.has_errors());
}
