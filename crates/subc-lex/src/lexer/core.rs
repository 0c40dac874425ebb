//! Core lexer implementation.
//!
//! This module contains the main `Lexer` struct, the `next_token`
//! dispatch loop, and whitespace handling. Category-specific scanning
//! lives in the sibling modules.

use subc_util::{DiagnosticBuilder, FileId, Handler, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lexer for the SB language.
///
/// Transforms source text into a stream of tokens, reporting lexical
/// errors to the diagnostics handler and continuing after each one.
pub struct Lexer<'a> {
    /// Character cursor for source traversal
    pub(super) cursor: Cursor<'a>,
    /// Diagnostics sink
    pub(super) handler: &'a Handler,
    /// File the source came from, stamped into every span
    file_id: FileId,
    /// Starting byte position of the current token
    pub(super) token_start: usize,
    /// Line where the current token starts (1-based)
    token_start_line: u32,
    /// Column where the current token starts (1-based)
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str, file_id: FileId, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            file_id,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Returns the next token from the source code.
    ///
    /// Skips insignificant whitespace and comments, then dispatches on
    /// the current character. Stray characters are reported and skipped
    /// so the stream keeps flowing; the final token is always `Eof`.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_blanks();

            self.token_start = self.cursor.position();
            self.token_start_line = self.cursor.line();
            self.token_start_column = self.cursor.column();

            if self.cursor.is_at_end() {
                return self.make_token(TokenKind::Eof);
            }

            match self.cursor.current_char() {
                '\n' => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::Newline);
                }
                '#' => {
                    // Either a comment (skip and rescan) or a Hash token
                    if let Some(token) = self.lex_hash() {
                        return token;
                    }
                }
                '(' => return self.single(TokenKind::LParen),
                ')' => return self.single(TokenKind::RParen),
                '{' => return self.single(TokenKind::LBrace),
                '}' => return self.single(TokenKind::RBrace),
                '[' => return self.single(TokenKind::LBracket),
                ']' => return self.single(TokenKind::RBracket),
                ',' => return self.single(TokenKind::Comma),
                ';' => return self.single(TokenKind::Semicolon),
                ':' => return self.single(TokenKind::Colon),
                '?' => return self.single(TokenKind::Question),
                '.' => return self.single(TokenKind::Dot),
                '+' | '-' | '*' | '/' | '%' | '=' | '!' | '<' | '>' | '&' | '|' => {
                    if let Some(token) = self.lex_operator() {
                        return token;
                    }
                }
                '"' | '\'' => return self.lex_string(),
                c if c.is_ascii_digit() => return self.lex_number(),
                c if c.is_ascii_alphabetic() || c == '_' => return self.lex_identifier(),
                c => {
                    self.report_error(format!("stray character `{}`", c));
                    self.cursor.advance();
                }
            }
        }
    }

    /// Lex the entire source into a vector ending with `Eof`
    pub fn collect_tokens(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return tokens;
            }
        }
    }

    /// Skip spaces, tabs, and carriage returns; newlines are tokens
    fn skip_blanks(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t' | '\r') {
            self.cursor.advance();
        }
    }

    /// Consume one character and wrap it in a token
    pub(super) fn single(&mut self, kind: TokenKind) -> Token {
        self.cursor.advance();
        self.make_token(kind)
    }

    /// Finish the token that started at `token_start`
    pub(super) fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.token_span())
    }

    /// Span of the current token so far
    pub(super) fn token_span(&self) -> Span {
        Span::with_file(
            self.token_start,
            self.cursor.position(),
            self.file_id,
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Report a lexical error at the current token position
    pub(super) fn report_error(&mut self, message: impl Into<String>) {
        DiagnosticBuilder::error(message)
            .span(self.token_span())
            .emit(self.handler);
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
