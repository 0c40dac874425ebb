//! Statement parsing - declarations, control flow, blocks.

use subc_lex::TokenKind;
use subc_util::kw;

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse a single statement
    ///
    /// Returns `None` after reporting a diagnostic; the caller
    /// resynchronizes. No partially-built node escapes.
    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.kind() {
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::Const => self.parse_const_decl(),
            TokenKind::Function => self.parse_function_decl(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                Some(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                Some(Stmt::Continue(span))
            }
            TokenKind::LBrace => Some(Stmt::Block(self.parse_brace_block()?)),
            _ => Some(Stmt::Expr(self.parse_expr()?)),
        }
    }

    /// `var` Ident [`:` Type] [`=` Expression]
    fn parse_var_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident()?;
        let ty = self.parse_type_annotation()?;
        let init = if self.match_token(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Some(Stmt::Var(VarDecl {
            name,
            ty,
            init,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `const` Ident [`:` Type] `=` Expression
    fn parse_const_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident()?;
        let ty = self.parse_type_annotation()?;
        self.expect(TokenKind::Assign)?;
        let init = self.parse_expr()?;
        Some(Stmt::Const(ConstDecl {
            name,
            ty,
            init,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `function` Ident `(` [params] `)` [`:` Type] Block
    fn parse_function_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let (param_name, param_span) = self.expect_ident()?;
                let ty = self.parse_type_annotation()?;
                params.push(Param {
                    name: param_name,
                    ty,
                    span: param_span.merge(self.prev_span()),
                });
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let ret_ty = self.parse_type_annotation()?;
        let body = self.parse_block_body(&[])?;
        self.eat_optional_end();

        Some(Stmt::Function(FunctionDecl {
            name,
            params,
            ret_ty,
            body,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `if` chain with nested `elif` representation
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let chain = self.parse_if_tail(start)?;
        self.eat_optional_end();
        Some(Stmt::If(chain))
    }

    /// Condition, then-block, and optional else arm; the `if`/`elif`
    /// keyword is already consumed
    fn parse_if_tail(&mut self, start: subc_util::Span) -> Option<IfStmt> {
        let cond = self.parse_expr()?;
        let then_block = self.parse_block_body(&[TokenKind::Elif, TokenKind::Else])?;

        // Only swallow separators when an else arm actually follows;
        // an `end` on its own line belongs to an enclosing bare block
        if matches!(
            self.peek_past_separators(),
            TokenKind::Elif | TokenKind::Else
        ) {
            self.skip_separators();
            self.eat_hash();
        }
        let else_arm = if self.at(TokenKind::Elif) {
            let elif_span = self.advance().span;
            Some(Box::new(ElseArm::Elif(self.parse_if_tail(elif_span)?)))
        } else if self.at(TokenKind::Else) {
            self.advance();
            Some(Box::new(ElseArm::Else(self.parse_block_body(&[])?)))
        } else {
            None
        };

        Some(IfStmt {
            cond,
            then_block,
            else_arm,
            span: start.merge(self.prev_span()),
        })
    }

    /// `while` Expression Block
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let cond = self.parse_expr()?;
        let body = self.parse_block_body(&[])?;
        self.eat_optional_end();
        Some(Stmt::While(WhileStmt {
            cond,
            body,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `do` Block `while` Expression
    fn parse_do_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let body = self.parse_block_body(&[TokenKind::While])?;
        self.skip_separators();
        self.eat_hash();
        self.expect(TokenKind::While)?;
        let cond = self.parse_expr()?;
        Some(Stmt::DoWhile(DoWhileStmt {
            body,
            cond,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `for` Ident `in` (RangeCall | Expression) Block
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let (var, _) = self.expect_ident()?;
        self.expect(TokenKind::In)?;

        let iter = if self.at_range_call() {
            self.parse_range_call()?
        } else {
            ForIter::Collection(self.parse_expr()?)
        };

        let body = self.parse_block_body(&[])?;
        self.eat_optional_end();

        Some(Stmt::For(ForStmt {
            var,
            iter,
            body,
            span: start.merge(self.prev_span()),
        }))
    }

    /// True when the for head starts with `range(`
    ///
    /// Only here is `range` special; everywhere else it is an ordinary
    /// identifier.
    fn at_range_call(&self) -> bool {
        matches!(self.kind(), TokenKind::Ident(name) if name == kw::RANGE)
            && self.peek_kind(1) == TokenKind::LParen
    }

    /// `range(end)` or `range(start, end)`
    fn parse_range_call(&mut self) -> Option<ForIter> {
        let start_span = self.advance().span; // `range`
        self.advance(); // `(`
        let first = self.parse_expr()?;
        let (start, end) = if self.match_token(TokenKind::Comma) {
            let second = self.parse_expr()?;
            (Some(first), second)
        } else {
            (None, first)
        };
        self.expect(TokenKind::RParen)?;
        Some(ForIter::Range {
            start,
            end,
            span: start_span.merge(self.prev_span()),
        })
    }

    /// `return` [Expression]
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let value = match self.kind() {
            TokenKind::Newline
            | TokenKind::Semicolon
            | TokenKind::RBrace
            | TokenKind::End
            | TokenKind::Elif
            | TokenKind::Else
            | TokenKind::Eof => None,
            _ => Some(self.parse_expr()?),
        };
        Some(Stmt::Return(ReturnStmt {
            value,
            span: start.merge(self.prev_span()),
        }))
    }

    /// `:` followed by a type name, if present
    fn parse_type_annotation(&mut self) -> Option<Option<TypeName>> {
        if !self.match_token(TokenKind::Colon) {
            return Some(None);
        }
        let span = self.span();
        let kind = match self.kind() {
            TokenKind::TyInt => TypeNameKind::Int,
            TokenKind::TyFloat => TypeNameKind::Float,
            TokenKind::TyString => TypeNameKind::String,
            TokenKind::TyBool => TypeNameKind::Bool,
            TokenKind::TyVoid => TypeNameKind::Void,
            TokenKind::TyAuto => TypeNameKind::Auto,
            found => {
                self.error_here(format!("expected type name, found {}", found.describe()));
                return None;
            }
        };
        self.advance();
        Some(Some(TypeName { kind, span }))
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// A block in either surface form: `{ ... }` or statements closed
    /// by `end` (or by one of `stops` inside an if chain / do body)
    pub(crate) fn parse_block_body(&mut self, stops: &[TokenKind]) -> Option<Block> {
        self.skip_separators();
        self.eat_hash();
        if self.at(TokenKind::LBrace) {
            self.parse_brace_block()
        } else {
            Some(self.parse_bare_block(stops))
        }
    }

    /// `{` statements `}`
    pub(crate) fn parse_brace_block(&mut self) -> Option<Block> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            self.eat_hash();
            match self.kind() {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    self.error_here("missing closing `}`");
                    break;
                }
                _ => self.parse_stmt_into(&mut stmts),
            }
        }
        self.match_token(TokenKind::RBrace);
        Some(Block {
            stmts,
            span: start.merge(self.prev_span()),
        })
    }

    /// Statements up to `end` (consumed) or one of `stops` (left for
    /// the caller)
    fn parse_bare_block(&mut self, stops: &[TokenKind]) -> Block {
        let start = self.span();
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            self.eat_hash();
            let kind = self.kind();
            if kind == TokenKind::End {
                self.advance();
                break;
            }
            if stops.contains(&kind) {
                break;
            }
            match kind {
                TokenKind::Eof => {
                    self.error_here("expected `end` to close block");
                    break;
                }
                TokenKind::RBrace => {
                    self.error_here("unexpected `}`; this block is closed by `end`");
                    break;
                }
                _ => self.parse_stmt_into(&mut stmts),
            }
        }
        Block {
            stmts,
            span: start.merge(self.prev_span()),
        }
    }

    /// Parse one statement into `stmts`, terminating or resyncing
    pub(crate) fn parse_stmt_into(&mut self, stmts: &mut Vec<Stmt>) {
        match self.parse_stmt() {
            Some(stmt) => {
                let wants_terminator = matches!(
                    stmt,
                    Stmt::Var(_)
                        | Stmt::Const(_)
                        | Stmt::DoWhile(_)
                        | Stmt::Return(_)
                        | Stmt::Break(_)
                        | Stmt::Continue(_)
                        | Stmt::Expr(_)
                );
                stmts.push(stmt);
                if wants_terminator {
                    self.terminate_stmt();
                }
            }
            None => self.synchronize(),
        }
    }

    /// Consume a trailing `end` on the same line after a braced
    /// if/while/for
    ///
    /// Newlines are deliberately not skipped first: an `end` on its own
    /// line closes an enclosing bare block, not this statement.
    fn eat_optional_end(&mut self) {
        if self.at(TokenKind::End) {
            self.advance();
        }
    }
}
