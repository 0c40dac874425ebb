//! Number literal lexing.

use super::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex an integer or float literal.
    ///
    /// A digit run is an integer; a digit run, exactly one `.`, and
    /// another digit run is a float. A second dot followed by a digit
    /// is a malformed literal: the whole run is consumed so the error
    /// does not cascade, and the token degrades to the valid prefix.
    pub(super) fn lex_number(&mut self) -> Token {
        self.eat_digits();

        let mut is_float = false;
        if self.cursor.current_char() == '.' && self.cursor.peek_next().is_ascii_digit() {
            is_float = true;
            self.cursor.advance(); // the dot
            self.eat_digits();
        }

        let valid_end = self.cursor.position();

        if self.cursor.current_char() == '.' && self.cursor.peek_next().is_ascii_digit() {
            while self.cursor.current_char() == '.' && self.cursor.peek_next().is_ascii_digit() {
                self.cursor.advance();
                self.eat_digits();
            }
            self.report_error("malformed number literal: more than one decimal point");
        }

        let text = self.cursor.slice(self.token_start, valid_end);
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.make_token(TokenKind::Float(value)),
                Err(_) => {
                    self.report_error(format!("malformed float literal `{}`", text));
                    self.make_token(TokenKind::Float(0.0))
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.make_token(TokenKind::Int(value)),
                Err(_) => {
                    self.report_error(format!("integer literal `{}` is out of range", text));
                    self.make_token(TokenKind::Int(0))
                }
            }
        }
    }

    fn eat_digits(&mut self) {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use subc_util::{FileId, Handler};

    use crate::token::TokenKind;

    fn lex(source: &str) -> (Vec<TokenKind>, usize) {
        let handler = Handler::new();
        let kinds = crate::tokenize(source, FileId::DUMMY, &handler)
            .into_iter()
            .map(|t| t.kind)
            .collect();
        (kinds, handler.error_count())
    }

    #[test]
    fn test_integer() {
        let (kinds, errors) = lex("42");
        assert_eq!(kinds, vec![TokenKind::Int(42), TokenKind::Eof]);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_float() {
        let (kinds, errors) = lex("3.25");
        assert_eq!(kinds, vec![TokenKind::Float(3.25), TokenKind::Eof]);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_trailing_dot_is_member_access() {
        // `1.` with no following digit: the dot is a separate token
        let (kinds, errors) = lex("1.");
        assert_eq!(kinds, vec![TokenKind::Int(1), TokenKind::Dot, TokenKind::Eof]);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_two_dots_is_malformed() {
        let (kinds, errors) = lex("1.2.3");
        assert_eq!(errors, 1);
        // Degrades to the valid prefix and keeps lexing
        assert_eq!(kinds, vec![TokenKind::Float(1.2), TokenKind::Eof]);
    }

    #[test]
    fn test_integer_out_of_range() {
        let (kinds, errors) = lex("99999999999999999999");
        assert_eq!(errors, 1);
        assert_eq!(kinds, vec![TokenKind::Int(0), TokenKind::Eof]);
    }

    #[test]
    fn test_number_then_identifier() {
        let (kinds, errors) = lex("10x");
        assert_eq!(errors, 0);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int(10),
                TokenKind::Ident(subc_util::Symbol::intern("x")),
                TokenKind::Eof
            ]
        );
    }
}
