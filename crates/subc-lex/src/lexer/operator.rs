//! Operator lexing.

use super::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex an operator starting at the current character.
    ///
    /// Two-character operators (`== != <= >= && || =>`) are preferred
    /// over their one-character prefixes. A lone `&` or `|` does not
    /// start any SB token and is reported; `None` tells the dispatch
    /// loop to rescan.
    pub(super) fn lex_operator(&mut self) -> Option<Token> {
        let c = self.cursor.current_char();
        self.cursor.advance();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.cursor.match_char('=') {
                    TokenKind::EqEq
                } else if self.cursor.match_char('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.cursor.match_char('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.cursor.match_char('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.cursor.match_char('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.cursor.match_char('&') {
                    TokenKind::AndAnd
                } else {
                    self.report_error("stray character `&` (did you mean `&&`?)");
                    return None;
                }
            }
            '|' => {
                if self.cursor.match_char('|') {
                    TokenKind::OrOr
                } else {
                    self.report_error("stray character `|` (did you mean `||`?)");
                    return None;
                }
            }
            _ => unreachable!("lex_operator called on non-operator character"),
        };
        Some(self.make_token(kind))
    }
}
