//! subc-par - Parser (Syntactic Analyzer)
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The parser turns the token stream into a `Vec<Stmt>` AST. Statements
//! use hand-written recursive descent (one method per construct,
//! `stmt.rs`); expressions use precedence climbing (`expr.rs`) with the
//! binding powers of the SB operator table:
//!
//! ```text
//! Level  Operators            Assoc
//! 0      =                    right (lvalue targets only)
//! 0.5    ?:                   right
//! 1      || or                left
//! 2      && and               left
//! 3      == !=                left
//! 4      < > <= >=            left
//! 5      + -                  left
//! 6      * / %                left
//! 7      unary - ! not        prefix
//! 8      call, index, member  postfix
//! ```
//!
//! The token stream is held as an immutable vector plus a cursor index;
//! no global parser state exists, so independent parses never
//! interfere.
//!
//! ============================================================================
//! BLOCK RESOLUTION
//! ============================================================================
//!
//! SB blocks come in two shapes and the parser accepts both everywhere
//! a block is expected:
//!
//! ```text
//! while n > 0 { print(n) }        brace form
//! while n > 0 print(n) end        bare form, closed by `end`
//! ```
//!
//! A bare block runs to `end` (or to `elif`/`else` inside an if chain,
//! or to `while` inside a do body). A trailing `end` after a braced
//! if/while/for is consumed and discarded, so `if c { .. } end` parses
//! the same as `if c { .. }`. `Hash` tokens from the `#keyword` dialect
//! are transparent in statement position.
//!
//! ============================================================================
//! ERROR RECOVERY
//! ============================================================================
//!
//! On an unexpected token the parser reports a diagnostic at the
//! token's span, drops the statement under construction, and skips to
//! the next statement boundary (newline, `;`, `}`, `end`, or EOF). No
//! node is ever built with a missing essential field.

pub mod ast;
mod expr;
pub mod pretty;
mod stmt;

pub use ast::*;

use subc_lex::{Token, TokenKind};
use subc_util::{DiagnosticBuilder, Handler, Span, Symbol};

/// Recursive-descent parser over a finished token vector
pub struct Parser<'a> {
    /// The token stream; always ends with `Eof`
    tokens: Vec<Token>,
    /// Cursor into `tokens`
    pos: usize,
    /// Diagnostics sink
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    /// Create a parser for a token stream
    ///
    /// The stream is expected to end with an `Eof` token (the lexer
    /// guarantees this); one is appended if missing.
    pub fn new(mut tokens: Vec<Token>, handler: &'a Handler) -> Self {
        if !matches!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof)) {
            let span = tokens.last().map(|t| t.span).unwrap_or(Span::DUMMY);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            handler,
        }
    }

    /// Parse a whole program
    pub fn parse(&mut self) -> Ast {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            self.eat_hash();
            if self.at(TokenKind::Eof) {
                break;
            }
            self.parse_stmt_into(&mut stmts);
        }
        stmts
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    /// The current token
    pub(crate) fn current(&self) -> Token {
        self.tokens[self.pos]
    }

    /// The current token's kind
    pub(crate) fn kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    /// Kind of the token `n` ahead of the cursor (0 = current)
    pub(crate) fn peek_kind(&self, n: usize) -> TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    /// The current token's span
    pub(crate) fn span(&self) -> Span {
        self.tokens[self.pos].span
    }

    /// Span of the most recently consumed token
    pub(crate) fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    /// Consume and return the current token; `Eof` is never passed
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos];
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// True if the current token has exactly this kind
    ///
    /// Only meaningful for payload-free kinds; literal and identifier
    /// tokens are matched with dedicated helpers.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consume the current token if it has this kind
    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of this kind or report "expected X, found Y"
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            self.error_here(format!(
                "expected {}, found {}",
                kind.describe(),
                self.kind().describe()
            ));
            None
        }
    }

    /// Consume an identifier or report an error
    pub(crate) fn expect_ident(&mut self) -> Option<(Symbol, Span)> {
        if let TokenKind::Ident(name) = self.kind() {
            let span = self.span();
            self.advance();
            Some((name, span))
        } else {
            self.error_here(format!("expected identifier, found {}", self.kind().describe()));
            None
        }
    }

    /// Skip newline and semicolon separators
    pub(crate) fn skip_separators(&mut self) {
        while matches!(self.kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Consume a `Hash` token when it prefixes a keyword
    pub(crate) fn eat_hash(&mut self) {
        if self.at(TokenKind::Hash) && self.peek_kind(1).is_keyword() {
            self.advance();
        }
    }

    /// The next significant token kind, looking through separators and
    /// keyword-prefix `Hash` tokens without consuming anything
    pub(crate) fn peek_past_separators(&self) -> TokenKind {
        let mut idx = self.pos;
        loop {
            let kind = self.tokens[idx.min(self.tokens.len() - 1)].kind;
            match kind {
                TokenKind::Newline | TokenKind::Semicolon => idx += 1,
                TokenKind::Hash
                    if self.tokens[(idx + 1).min(self.tokens.len() - 1)].kind.is_keyword() =>
                {
                    idx += 1
                }
                _ => return kind,
            }
        }
    }

    /// Require the current statement to be over
    ///
    /// Newline and `;` are consumed; `}` / `end` / `elif` / `else` /
    /// EOF close the statement without being consumed. Anything else is
    /// an error followed by resynchronization.
    pub(crate) fn terminate_stmt(&mut self) {
        match self.kind() {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::RBrace
            | TokenKind::End
            | TokenKind::Elif
            | TokenKind::Else
            | TokenKind::Eof => {}
            found => {
                self.error_here(format!("expected end of statement, found {}", found.describe()));
                self.synchronize();
            }
        }
    }

    /// Skip to the next statement boundary after an error
    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Newline | TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace | TokenKind::End | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Report an error at the current token
    pub(crate) fn error_here(&mut self, message: impl Into<String>) {
        self.error_at(message, self.span());
    }

    /// Report an error at a specific span
    pub(crate) fn error_at(&mut self, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::{parse_ok, parse_with_errors};
    use super::*;

    #[test]
    fn test_empty_program() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("\n\n  \n").is_empty());
        assert!(parse_ok("# only a comment\n").is_empty());
    }

    #[test]
    fn test_statements_separated_by_newlines_and_semicolons() {
        let ast = parse_ok("var x = 1\nvar y = 2; var z = 3");
        assert_eq!(ast.len(), 3);
    }

    #[test]
    fn test_hash_dialect_statement() {
        let ast = parse_ok("#var x = 1");
        assert_eq!(ast.len(), 1);
        assert!(matches!(ast[0], Stmt::Var(_)));
    }

    #[test]
    fn test_error_recovery_continues_parsing() {
        // First line is malformed; the parser must still deliver the
        // second statement
        let (ast, errors) = parse_with_errors("var = 3\nvar ok = 1\n");
        assert!(errors >= 1);
        assert!(ast.iter().any(|s| matches!(s, Stmt::Var(d) if d.name.as_str() == "ok")));
    }

    #[test]
    fn test_missing_terminator_reported() {
        let (_, errors) = parse_with_errors("var x = 1 var y = 2");
        assert!(errors >= 1);
    }
}
