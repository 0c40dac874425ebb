//! Lexer round-trip property: token spans tile the source.
//!
//! For comment-free input, every byte of the source is either inside
//! exactly one token's span or is whitespace between tokens, so
//! concatenating the span slices with the original gaps restored
//! reproduces the input byte for byte.

use proptest::prelude::*;

use subc_lex::{tokenize, TokenKind};
use subc_util::{FileId, Handler};

/// One valid SB lexeme, chosen so that space-separated sequences are
/// always lexically well formed
fn lexeme() -> impl Strategy<Value = String> {
    let keywords = proptest::sample::select(vec![
        "var", "const", "function", "if", "elif", "else", "while", "for", "in", "end", "true",
        "false", "return",
    ]);
    let operators = proptest::sample::select(vec![
        "+", "-", "*", "/", "%", "=", "==", "!=", "<", ">", "<=", ">=", "&&", "||", "!", "(", ")",
        "{", "}", "[", "]", ",", ":", ";",
    ]);
    prop_oneof![
        // Identifiers (never keywords: the leading underscore sees to it)
        "[_][a-z][a-z0-9_]{0,8}",
        keywords.prop_map(str::to_string),
        // Numbers
        (0u32..100_000).prop_map(|n| n.to_string()),
        (0u32..1000, 1u32..1000).prop_map(|(a, b)| format!("{}.{}", a, b)),
        // Strings over a quote-free, escape-free alphabet
        "[a-z ]{0,10}".prop_map(|s| format!("\"{}\"", s)),
        operators.prop_map(str::to_string),
    ]
}

/// Whitespace separators, including newlines (which lex as tokens)
fn separator() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(" ".to_string()),
        Just("  ".to_string()),
        Just("\t".to_string()),
        Just("\n".to_string()),
        Just(" \n ".to_string()),
    ]
}

proptest! {
    #[test]
    fn token_spans_tile_the_source(
        pieces in proptest::collection::vec((lexeme(), separator()), 0..40)
    ) {
        let mut source = String::new();
        for (lexeme, sep) in &pieces {
            source.push_str(lexeme);
            source.push_str(sep);
        }

        let handler = Handler::new();
        let tokens = tokenize(&source, FileId::DUMMY, &handler);
        prop_assert_eq!(handler.error_count(), 0, "input was well-formed: {:?}", source);

        // Rebuild the source: gaps + span slices, in order
        let mut rebuilt = String::new();
        let mut cursor = 0usize;
        for token in &tokens {
            if token.kind == TokenKind::Eof {
                break;
            }
            prop_assert!(token.span.start >= cursor, "overlapping spans");
            let gap = &source[cursor..token.span.start];
            prop_assert!(
                gap.chars().all(|c| c == ' ' || c == '\t' || c == '\r'),
                "non-whitespace byte outside every token span: {:?}",
                gap
            );
            rebuilt.push_str(gap);
            rebuilt.push_str(&source[token.span.start..token.span.end]);
            cursor = token.span.end;
        }
        rebuilt.push_str(&source[cursor..]);
        prop_assert_eq!(rebuilt, source);
    }

    #[test]
    fn every_token_location_is_inside_its_lexeme(
        pieces in proptest::collection::vec((lexeme(), separator()), 1..20)
    ) {
        let mut source = String::new();
        for (lexeme, sep) in &pieces {
            source.push_str(lexeme);
            source.push_str(sep);
        }

        let handler = Handler::new();
        let tokens = tokenize(&source, FileId::DUMMY, &handler);
        for token in &tokens {
            if token.kind == TokenKind::Eof {
                continue;
            }
            prop_assert!(token.span.start < token.span.end);
            prop_assert!(token.span.end <= source.len());
            prop_assert!(token.span.line >= 1);
            prop_assert!(token.span.column >= 1);
        }
    }
}

#[test]
fn spans_tile_a_realistic_program() {
    let source = "var x = 10\nvar y = 20\nprint(x + y * 2)\n";
    let handler = Handler::new();
    let tokens = tokenize(source, FileId::DUMMY, &handler);
    assert_eq!(handler.error_count(), 0);

    let mut rebuilt = String::new();
    let mut cursor = 0usize;
    for token in &tokens {
        if token.kind == TokenKind::Eof {
            break;
        }
        rebuilt.push_str(&source[cursor..token.span.start]);
        rebuilt.push_str(&source[token.span.start..token.span.end]);
        cursor = token.span.end;
    }
    rebuilt.push_str(&source[cursor..]);
    assert_eq!(rebuilt, source);
}
