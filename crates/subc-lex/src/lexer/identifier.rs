//! Identifier and keyword lexing.

use subc_util::Symbol;

use super::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex an identifier or keyword.
    ///
    /// The first character is a letter or `_`; subsequent characters
    /// are letters, digits, or `_`. Keywords are matched by exact text
    /// after the scan.
    pub(super) fn lex_identifier(&mut self) -> Token {
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice(self.token_start, self.cursor.position());
        match TokenKind::keyword_from_str(text) {
            Some(keyword) => self.make_token(keyword),
            None => self.make_token(TokenKind::Ident(Symbol::intern(text))),
        }
    }
}

/// True for characters that may continue an identifier
pub(super) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use subc_util::{FileId, Handler, Symbol};

    use crate::token::TokenKind;

    fn first_kind(source: &str) -> TokenKind {
        let handler = Handler::new();
        crate::tokenize(source, FileId::DUMMY, &handler)[0].kind
    }

    #[test]
    fn test_plain_identifier() {
        assert_eq!(
            first_kind("counter"),
            TokenKind::Ident(Symbol::intern("counter"))
        );
        assert_eq!(
            first_kind("_private9"),
            TokenKind::Ident(Symbol::intern("_private9"))
        );
    }

    #[test]
    fn test_keywords_recognized() {
        assert_eq!(first_kind("var"), TokenKind::Var);
        assert_eq!(first_kind("while"), TokenKind::While);
        assert_eq!(first_kind("elif"), TokenKind::Elif);
        assert_eq!(first_kind("not"), TokenKind::Not);
        assert_eq!(first_kind("void"), TokenKind::TyVoid);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            first_kind("variable"),
            TokenKind::Ident(Symbol::intern("variable"))
        );
        assert_eq!(first_kind("iff"), TokenKind::Ident(Symbol::intern("iff")));
    }

    #[test]
    fn test_range_is_plain_identifier() {
        // `range` is only special inside a for-head; lexically it is an
        // ordinary identifier
        assert_eq!(first_kind("range"), TokenKind::Ident(Symbol::intern("range")));
    }
}
