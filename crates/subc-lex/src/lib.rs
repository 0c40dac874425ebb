//! subc-lex - Lexical Analyzer (Lexer/Tokenizer)
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The lexer is the first phase of the subc pipeline. It transforms the
//! raw UTF-8 source text of an SB program into a finite token stream
//! terminated by an end-of-file token. Every token carries a [`Span`]
//! with byte offsets and 1-based line/column, so later phases can report
//! precise locations without re-scanning the source.
//!
//! The implementation is direct-coded: one function per token category,
//! dispatched on the first character. No tables, no regex engines; the
//! language is small enough that hand-written scanning stays readable
//! and gives the best diagnostics.
//!
//! ============================================================================
//! TOKEN CATEGORIES
//! ============================================================================
//!
//! 1. STRUCTURAL - `#` `(` `)` `{` `}` `[` `]` `.` `,` `:` `;` `?`,
//!    explicit newline tokens, and end-of-file.
//!
//! 2. KEYWORDS - `var const function return if elif else for while do
//!    break continue end true false null in and or not` plus the type
//!    names `int float string bool void auto`. Keywords are recognized
//!    by exact text after scanning an identifier run.
//!
//! 3. LITERALS - integers (digit run), floats (digit run, one dot,
//!    digit run), and strings (either quote style, with escape
//!    processing; the token carries the unescaped payload).
//!
//! 4. IDENTIFIERS - `[A-Za-z_][A-Za-z0-9_]*`, interned as [`Symbol`]s.
//!
//! 5. OPERATORS - `+ - * / % = == != < > <= >= && || ! =>`. Two-character
//!    operators win over their one-character prefixes.
//!
//! ============================================================================
//! SB SURFACE QUIRKS
//! ============================================================================
//!
//! NEWLINES:
//! ---------
//! Newlines terminate statements in SB, so unlike most whitespace they
//! are preserved as explicit `Newline` tokens. All other whitespace
//! only separates tokens and is dropped.
//!
//! THE `#` RULE:
//! -------------
//! SB has two surface dialects. In the prefixed dialect keywords are
//! written `#if`, `#while`, ...; in the unprefixed dialect `#` starts a
//! line comment. The lexer disambiguates by looking at the letter run
//! after the `#`:
//!
//! ```text
//! #if x > 0      ->  [Hash] [if] [x] [>] [0]     (known keyword)
//! # just a note  ->  (skipped to end of line)    (not a keyword)
//! ```
//!
//! The parser treats `Hash` tokens as transparent, so both dialects
//! parse identically.
//!
//! ============================================================================
//! ERROR RECOVERY
//! ============================================================================
//!
//! Every lexical error (unterminated string, bad escape, stray
//! character, malformed number) is reported to the diagnostics handler
//! and lexing continues, so one invocation surfaces as many problems as
//! possible. The token stream always ends with `Eof` regardless of how
//! many errors occurred; the driver decides whether to keep going.

pub mod cursor;
mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};

use subc_util::{FileId, Handler};

/// Lex an entire source buffer into a token vector ending with `Eof`.
///
/// Convenience wrapper over [`Lexer`] for callers that want the whole
/// stream up front (the parser does).
pub fn tokenize(source: &str, file_id: FileId, handler: &Handler) -> Vec<Token> {
    Lexer::new(source, file_id, handler).collect_tokens()
}
