//! The `#` comment / keyword-prefix rule.

use super::identifier::is_ident_continue;
use super::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Decide what a `#` starts.
    ///
    /// If the letter run immediately after the `#` spells a known
    /// keyword, the `#` is the prefixed-dialect marker: a `Hash` token
    /// is emitted and the keyword is lexed normally on the next call.
    /// Any other content makes the rest of the line a comment; `None`
    /// tells the dispatch loop to rescan after it.
    pub(super) fn lex_hash(&mut self) -> Option<Token> {
        let after = &self.cursor.rest()[1..];
        let run_len = after
            .chars()
            .take_while(|&c| is_ident_continue(c))
            .map(char::len_utf8)
            .sum::<usize>();

        if TokenKind::keyword_from_str(&after[..run_len]).is_some() {
            return Some(self.single(TokenKind::Hash));
        }

        // Comment: skip to end of line, leaving the newline for the
        // dispatch loop so statement termination still works
        while !matches!(self.cursor.current_char(), '\n' | '\0') {
            self.cursor.advance();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use subc_util::{FileId, Handler, Symbol};

    use crate::token::TokenKind;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let handler = Handler::new();
        crate::tokenize(source, FileId::DUMMY, &handler)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_comment_skipped_to_eol() {
        assert_eq!(
            kinds("# this is a note\nvar"),
            vec![TokenKind::Newline, TokenKind::Var, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comment_at_eof() {
        assert_eq!(kinds("# trailing"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_hash_before_keyword() {
        assert_eq!(
            kinds("#if x"),
            vec![
                TokenKind::Hash,
                TokenKind::If,
                TokenKind::Ident(Symbol::intern("x")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hash_before_non_keyword_is_comment() {
        // `note` is not a keyword, so the whole line is a comment
        assert_eq!(kinds("#note var x"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_hash_keyword_prefix_word_is_comment() {
        // `iffy` starts with `if` but is not itself a keyword
        assert_eq!(kinds("#iffy"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_bare_hash_is_comment() {
        assert_eq!(kinds("#\nend"), vec![TokenKind::Newline, TokenKind::End, TokenKind::Eof]);
    }
}
