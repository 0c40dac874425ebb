//! Parser round-trip: pretty-printing an AST and re-parsing it yields a
//! structurally equal AST.
//!
//! Structural equality is checked by comparing the canonical
//! pretty-printed forms, which erase spans and surface-dialect
//! differences but preserve structure exactly.

use subc_par::pretty::program_to_string;
use subc_par::{Ast, Parser};
use subc_util::{FileId, Handler};

fn parse(source: &str) -> Ast {
    let handler = Handler::new();
    let tokens = subc_lex::tokenize(source, FileId::DUMMY, &handler);
    let ast = Parser::new(tokens, &handler).parse();
    assert_eq!(
        handler.error_count(),
        0,
        "diagnostics for {:?}: {:?}",
        source,
        handler.diagnostics()
    );
    ast
}

fn assert_roundtrip(source: &str) {
    let first = program_to_string(&parse(source));
    let second = program_to_string(&parse(&first));
    assert_eq!(first, second, "round-trip diverged for {:?}", source);
}

#[test]
fn roundtrip_declarations() {
    assert_roundtrip("var x = 10\nvar y: float = 2.5\nconst name = \"sb\"");
    assert_roundtrip("var empty\nvar typed: bool");
}

#[test]
fn roundtrip_arithmetic_and_logic() {
    assert_roundtrip("print(x + y * 2)");
    assert_roundtrip("var ok = a < b && c != d || !e");
    assert_roundtrip("var t = c ? 1 : 2");
    assert_roundtrip("var n = -x % 3");
}

#[test]
fn roundtrip_control_flow() {
    assert_roundtrip("if age >= 18 { print(\"adult\") } else { print(\"minor\") } end");
    assert_roundtrip("if a { x } elif b { y } elif c { z } else { w }");
    assert_roundtrip("while n > 0 { print(n); n = n - 1 } end");
    assert_roundtrip("do { n = n + 1 } while n < 10");
}

#[test]
fn roundtrip_loops() {
    assert_roundtrip("for i in range(5) { s = s + i } end");
    assert_roundtrip("for i in range(1, 10) { print(i) }");
    assert_roundtrip("for item in items { print(item) }");
    assert_roundtrip("while true { break }\nwhile false { continue }");
}

#[test]
fn roundtrip_functions() {
    assert_roundtrip("function add(a: int, b: int): int { return a + b }\nprint(add(1, 2))");
    assert_roundtrip("function shout(msg: string) { print(msg) }");
    assert_roundtrip("function f() { return }");
}

#[test]
fn roundtrip_arrays() {
    assert_roundtrip("var arr = [1, 2, 3]\narr[1] = 10\nprint(arr[0])");
    assert_roundtrip("var grid = [a, b][i]");
}

#[test]
fn roundtrip_strings() {
    assert_roundtrip("var s = \"line\\nbreak\\ttab\\\\slash\\\"quote\"");
    assert_roundtrip("var a = \"Hello, \"\nvar b = \"World\"\nprint(a + b)");
}

#[test]
fn roundtrip_bare_block_dialect() {
    // Bare `end` blocks normalize to brace blocks and stay stable
    assert_roundtrip("while n > 0\n  n = n - 1\nend");
    assert_roundtrip("if c\n  print(1)\nelse\n  print(2)\nend");
    assert_roundtrip("function f(x: int): int\n  return x\nend");
}

#[test]
fn roundtrip_hash_dialect() {
    // The `#keyword` dialect normalizes to the unprefixed form
    assert_roundtrip("#if a { x } #else { y }");
    assert_roundtrip("#var n = 1\n#while n < 3 { n = n + 1 }");
}

#[test]
fn roundtrip_nested_structures() {
    assert_roundtrip(
        "function classify(n: int): string {\n\
         if n < 0 { return \"neg\" } elif n == 0 { return \"zero\" } else { return \"pos\" }\n\
         }\n\
         for i in range(3) { print(classify(i - 1)) }",
    );
}
