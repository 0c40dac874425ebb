//! String literal lexing.

use subc_util::Symbol;

use super::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex a string literal delimited by `"` or `'`.
    ///
    /// Escapes `\n \t \r \\ \" \'` are interpreted; the token carries
    /// the unescaped payload. An unterminated literal (end of line or
    /// end of file before the closing quote) is reported and the
    /// partial payload kept.
    pub(super) fn lex_string(&mut self) -> Token {
        let quote = self.cursor.current_char();
        self.cursor.advance();

        let mut value = String::new();
        loop {
            match self.cursor.current_char() {
                '\0' | '\n' => {
                    self.report_error("unterminated string literal");
                    break;
                }
                '\\' => {
                    self.cursor.advance();
                    let escaped = self.cursor.current_char();
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        '\'' => value.push('\''),
                        '\0' | '\n' => {
                            self.report_error("unterminated string literal");
                            break;
                        }
                        other => {
                            self.report_error(format!("invalid escape sequence `\\{}`", other));
                            value.push(other);
                        }
                    }
                    self.cursor.advance();
                }
                c if c == quote => {
                    self.cursor.advance();
                    break;
                }
                c => {
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }

        self.make_token(TokenKind::Str(Symbol::intern(&value)))
    }
}

#[cfg(test)]
mod tests {
    use subc_util::{FileId, Handler, Symbol};

    use crate::token::TokenKind;

    fn lex(source: &str) -> (Vec<TokenKind>, usize) {
        let handler = Handler::new();
        let kinds = crate::tokenize(source, FileId::DUMMY, &handler)
            .into_iter()
            .map(|t| t.kind)
            .collect();
        (kinds, handler.error_count())
    }

    fn str_kind(text: &str) -> TokenKind {
        TokenKind::Str(Symbol::intern(text))
    }

    #[test]
    fn test_double_quoted() {
        let (kinds, errors) = lex("\"hello\"");
        assert_eq!(kinds, vec![str_kind("hello"), TokenKind::Eof]);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_single_quoted() {
        let (kinds, errors) = lex("'world'");
        assert_eq!(kinds, vec![str_kind("world"), TokenKind::Eof]);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_escapes() {
        let (kinds, errors) = lex(r#""a\nb\tc\\d\"e""#);
        assert_eq!(kinds, vec![str_kind("a\nb\tc\\d\"e"), TokenKind::Eof]);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_other_quote_is_plain() {
        // A single quote inside a double-quoted string needs no escape
        let (kinds, errors) = lex("\"it's\"");
        assert_eq!(kinds, vec![str_kind("it's"), TokenKind::Eof]);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_unterminated_at_eof() {
        let (kinds, errors) = lex("\"oops");
        assert_eq!(errors, 1);
        assert_eq!(kinds, vec![str_kind("oops"), TokenKind::Eof]);
    }

    #[test]
    fn test_unterminated_at_newline() {
        let (kinds, errors) = lex("\"oops\nvar");
        assert_eq!(errors, 1);
        // Lexing resumes on the next line
        assert_eq!(
            kinds,
            vec![str_kind("oops"), TokenKind::Newline, TokenKind::Var, TokenKind::Eof]
        );
    }

    #[test]
    fn test_invalid_escape() {
        let (kinds, errors) = lex(r#""a\qb""#);
        assert_eq!(errors, 1);
        // The escaped character is kept verbatim
        assert_eq!(kinds, vec![str_kind("aqb"), TokenKind::Eof]);
    }
}
