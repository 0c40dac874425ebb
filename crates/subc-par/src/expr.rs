//! Expression parsing via precedence climbing.
//!
//! Binding powers follow the SB operator table; left-associative
//! operators recurse with `level + 1`, the right-associative assignment
//! and ternary rules recurse at their own level.

use subc_lex::TokenKind;

use crate::ast::*;
use crate::Parser;

/// Binding power levels; higher binds tighter
pub(crate) mod bp {
    pub const MIN: u8 = 0;
    /// `||`, `or`
    pub const OR: u8 = 2;
    /// `&&`, `and`
    pub const AND: u8 = 4;
    /// `==`, `!=`
    pub const EQUALITY: u8 = 6;
    /// `<`, `>`, `<=`, `>=`
    pub const COMPARISON: u8 = 8;
    /// `+`, `-`
    pub const ADDITIVE: u8 = 10;
    /// `*`, `/`, `%`
    pub const MULTIPLICATIVE: u8 = 12;
}

impl<'a> Parser<'a> {
    /// Main expression entry point: assignment level
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_assign()
    }

    /// `=` is right-associative and restricted to lvalue targets
    fn parse_assign(&mut self) -> Option<Expr> {
        let lhs = self.parse_ternary()?;
        if !self.match_token(TokenKind::Assign) {
            return Some(lhs);
        }

        if !lhs.is_lvalue() {
            self.error_at(
                "invalid assignment target; expected a variable or array element",
                lhs.span,
            );
            return None;
        }

        let value = self.parse_assign()?;
        let span = lhs.span.merge(value.span);
        Some(Expr {
            kind: ExprKind::Assign {
                target: Box::new(lhs),
                value: Box::new(value),
            },
            span,
        })
    }

    /// `cond ? then : else`, right-associative
    fn parse_ternary(&mut self) -> Option<Expr> {
        let cond = self.parse_binary(bp::MIN)?;
        if !self.match_token(TokenKind::Question) {
            return Some(cond);
        }

        let then_expr = self.parse_ternary()?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.parse_ternary()?;
        let span = cond.span.merge(else_expr.span);
        Some(Expr {
            kind: ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        })
    }

    /// Precedence-climbing core for the binary operator levels
    fn parse_binary(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, level)) = self.current_infix_op() else {
                break;
            };
            if level < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(level + 1)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
        Some(lhs)
    }

    /// The infix operator at the cursor with its binding power
    fn current_infix_op(&self) -> Option<(BinOp, u8)> {
        let pair = match self.kind() {
            TokenKind::OrOr | TokenKind::Or => (BinOp::Or, bp::OR),
            TokenKind::AndAnd | TokenKind::And => (BinOp::And, bp::AND),
            TokenKind::EqEq => (BinOp::Eq, bp::EQUALITY),
            TokenKind::NotEq => (BinOp::Ne, bp::EQUALITY),
            TokenKind::Lt => (BinOp::Lt, bp::COMPARISON),
            TokenKind::LtEq => (BinOp::Le, bp::COMPARISON),
            TokenKind::Gt => (BinOp::Gt, bp::COMPARISON),
            TokenKind::GtEq => (BinOp::Ge, bp::COMPARISON),
            TokenKind::Plus => (BinOp::Add, bp::ADDITIVE),
            TokenKind::Minus => (BinOp::Sub, bp::ADDITIVE),
            TokenKind::Star => (BinOp::Mul, bp::MULTIPLICATIVE),
            TokenKind::Slash => (BinOp::Div, bp::MULTIPLICATIVE),
            TokenKind::Percent => (BinOp::Mod, bp::MULTIPLICATIVE),
            _ => return None,
        };
        Some(pair)
    }

    /// Prefix operators `-`, `!`, `not`
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Bang | TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };

        let op_span = self.advance().span;
        let operand = self.parse_unary()?;
        let span = op_span.merge(operand.span);
        Some(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        })
    }

    /// Postfix call, index, and member access
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    let ExprKind::Ident(callee) = expr.kind else {
                        self.error_here("only named functions can be called");
                        return None;
                    };
                    self.advance();
                    let args = self.parse_call_args()?;
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr {
                        kind: ExprKind::Call { callee, args },
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr {
                        kind: ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let (field, _) = self.expect_ident()?;
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr {
                        kind: ExprKind::Member {
                            base: Box::new(expr),
                            field,
                        },
                        span,
                    };
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// Comma-separated arguments up to `)`
    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Some(args)
    }

    /// Literals, identifiers, array literals, and parenthesized
    /// expressions
    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.span();
        let kind = match self.kind() {
            TokenKind::Int(value) => {
                self.advance();
                ExprKind::Int(value)
            }
            TokenKind::Float(value) => {
                self.advance();
                ExprKind::Float(value)
            }
            TokenKind::Str(value) => {
                self.advance();
                ExprKind::Str(value)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::Null
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                return Some(Expr {
                    kind: inner.kind,
                    span: span.merge(self.prev_span()),
                });
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.at(TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr()?);
                        if !self.match_token(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket)?;
                return Some(Expr {
                    kind: ExprKind::Array(elements),
                    span: span.merge(self.prev_span()),
                });
            }
            TokenKind::FatArrow => {
                self.error_here("`=>` is reserved for arrow functions and cannot appear here");
                return None;
            }
            found => {
                self.error_here(format!("expected expression, found {}", found.describe()));
                return None;
            }
        };
        Some(Expr { kind, span })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::{parse_ok, parse_with_errors};
    use crate::*;

    fn only_expr(source: &str) -> Expr {
        let mut ast = parse_ok(source);
        assert_eq!(ast.len(), 1);
        match ast.remove(0) {
            Stmt::Expr(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    /// Render just enough structure to assert on precedence
    fn shape(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Int(v) => v.to_string(),
            ExprKind::Float(v) => format!("{:?}", v),
            ExprKind::Bool(v) => v.to_string(),
            ExprKind::Str(s) => format!("{:?}", s.as_str()),
            ExprKind::Null => "null".into(),
            ExprKind::Ident(name) => name.as_str().to_string(),
            ExprKind::Binary { op, lhs, rhs } => {
                format!("({} {} {})", shape(lhs), op.as_str(), shape(rhs))
            }
            ExprKind::Unary { op, operand } => format!("({}{})", op.as_str(), shape(operand)),
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => format!("({} ? {} : {})", shape(cond), shape(then_expr), shape(else_expr)),
            ExprKind::Assign { target, value } => {
                format!("({} = {})", shape(target), shape(value))
            }
            ExprKind::Call { callee, args } => {
                let args: Vec<_> = args.iter().map(shape).collect();
                format!("{}({})", callee.as_str(), args.join(", "))
            }
            ExprKind::Index { base, index } => format!("{}[{}]", shape(base), shape(index)),
            ExprKind::Member { base, field } => format!("{}.{}", shape(base), field.as_str()),
            ExprKind::Array(elements) => {
                let elements: Vec<_> = elements.iter().map(shape).collect();
                format!("[{}]", elements.join(", "))
            }
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(shape(&only_expr("x + y * 2")), "(x + (y * 2))");
        assert_eq!(shape(&only_expr("x * y + 2")), "((x * y) + 2)");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(shape(&only_expr("a - b - c")), "((a - b) - c)");
        assert_eq!(shape(&only_expr("a / b / c")), "((a / b) / c)");
    }

    #[test]
    fn test_comparison_and_logic_levels() {
        assert_eq!(
            shape(&only_expr("a < b && c == d || e")),
            "(((a < b) && (c == d)) || e)"
        );
    }

    #[test]
    fn test_keyword_logic_operators() {
        assert_eq!(shape(&only_expr("a and b or not c")), "((a && b) || (!c))");
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        assert_eq!(shape(&only_expr("-a * b")), "((-a) * b)");
        assert_eq!(shape(&only_expr("!a && b")), "((!a) && b)");
        assert_eq!(shape(&only_expr("--a")), "(-(-a))");
    }

    #[test]
    fn test_parentheses_override() {
        assert_eq!(shape(&only_expr("(x + y) * 2")), "((x + y) * 2)");
    }

    #[test]
    fn test_assignment_right_associative() {
        assert_eq!(shape(&only_expr("a = b = 1")), "(a = (b = 1))");
    }

    #[test]
    fn test_assignment_to_index() {
        assert_eq!(shape(&only_expr("arr[1] = 10")), "(arr[1] = 10)");
    }

    #[test]
    fn test_invalid_lvalue_reported() {
        let (_, errors) = parse_with_errors("1 + 2 = 3\n");
        assert!(errors >= 1);
        let (_, errors) = parse_with_errors("f() = 3\n");
        assert!(errors >= 1);
    }

    #[test]
    fn test_ternary() {
        assert_eq!(shape(&only_expr("c ? a : b")), "(c ? a : b)");
        // Right-associative in the else position
        assert_eq!(shape(&only_expr("c ? a : d ? x : y")), "(c ? a : (d ? x : y))");
    }

    #[test]
    fn test_call_and_postfix_chain() {
        assert_eq!(shape(&only_expr("f(1, x + 2)")), "f(1, (x + 2))");
        assert_eq!(shape(&only_expr("a[0][1]")), "a[0][1]");
        assert_eq!(shape(&only_expr("p.x")), "p.x");
    }

    #[test]
    fn test_call_requires_name() {
        let (_, errors) = parse_with_errors("a[0](1)\n");
        assert!(errors >= 1);
    }

    #[test]
    fn test_array_literal() {
        assert_eq!(shape(&only_expr("[1, 2, 3]")), "[1, 2, 3]");
        assert_eq!(shape(&only_expr("[]")), "[]");
    }

    #[test]
    fn test_literals() {
        assert_eq!(shape(&only_expr("true")), "true");
        assert_eq!(shape(&only_expr("null")), "null");
        assert_eq!(shape(&only_expr("\"hi\"")), "\"hi\"");
    }

    #[test]
    fn test_fat_arrow_is_reserved() {
        let (_, errors) = parse_with_errors("var f = x => x\n");
        assert!(errors >= 1);
    }
}
