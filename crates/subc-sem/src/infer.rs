//! Expression type inference and coercion.

use subc_par::ast::{self, BinOp, UnOp};
use subc_util::kw;

use crate::hir::{Expr, ExprKind, Place};
use crate::types::DataType;
use crate::SemanticAnalyzer;

impl<'a> SemanticAnalyzer<'a> {
    /// Infer the type of an expression, producing its typed HIR form
    ///
    /// On a rule violation a diagnostic is reported and the node gets
    /// the recovery type `unknown`, which suppresses cascading errors
    /// further up the tree.
    pub(crate) fn check_expr(&mut self, expr: &ast::Expr) -> Expr {
        let span = expr.span;
        match &expr.kind {
            ast::ExprKind::Int(value) => Expr {
                kind: ExprKind::Int(*value),
                ty: DataType::Int,
                span,
            },
            ast::ExprKind::Float(value) => Expr {
                kind: ExprKind::Float(*value),
                ty: DataType::Float,
                span,
            },
            ast::ExprKind::Str(value) => Expr {
                kind: ExprKind::Str(*value),
                ty: DataType::String,
                span,
            },
            ast::ExprKind::Bool(value) => Expr {
                kind: ExprKind::Bool(*value),
                ty: DataType::Bool,
                span,
            },
            ast::ExprKind::Null => Expr {
                kind: ExprKind::Null,
                ty: DataType::Null,
                span,
            },
            ast::ExprKind::Ident(name) => match self.scopes.resolve(*name) {
                Some(symbol) => Expr {
                    kind: ExprKind::Local(symbol.local),
                    ty: symbol.ty.clone(),
                    span,
                },
                None => {
                    if self.signatures.contains_key(name) {
                        self.error(
                            format!("function `{}` cannot be used as a value", name),
                            span,
                        );
                    } else {
                        self.error(format!("undeclared identifier `{}`", name), span);
                    }
                    self.recovery(span)
                }
            },
            ast::ExprKind::Array(elements) => self.check_array_literal(elements, span),
            ast::ExprKind::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs, span),
            ast::ExprKind::Unary { op, operand } => self.check_unary(*op, operand, span),
            ast::ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.check_ternary(cond, then_expr, else_expr, span),
            ast::ExprKind::Assign { target, value } => self.check_assign(target, value, span),
            ast::ExprKind::Call { callee, args } => self.check_call(*callee, args, span),
            ast::ExprKind::Index { base, index } => self.check_index(base, index, span),
            ast::ExprKind::Member { base, .. } => {
                let base = self.check_expr(base);
                if !base.ty.is_unknown() {
                    self.error(
                        format!("member access is not supported on {}", base.ty),
                        span,
                    );
                }
                self.recovery(span)
            }
        }
    }

    /// Coerce an expression to a target type
    ///
    /// Identity when the types already match; `int` widens to `float`
    /// via an explicit node; `null` adopts any pointer-shaped target.
    /// Anything else is a type mismatch.
    pub(crate) fn coerce(&mut self, expr: Expr, target: &DataType, what: &str) -> Expr {
        if expr.ty.is_unknown() || target.is_unknown() {
            return expr;
        }
        if expr.ty == *target {
            return expr;
        }
        if expr.ty == DataType::Int && *target == DataType::Float {
            let span = expr.span;
            return Expr {
                kind: ExprKind::IntToFloat(Box::new(expr)),
                ty: DataType::Float,
                span,
            };
        }
        if expr.ty == DataType::Null && target.accepts_null() {
            return Expr {
                kind: ExprKind::Null,
                ty: target.clone(),
                span: expr.span,
            };
        }

        self.error(
            format!(
                "type mismatch in {}: expected {}, found {}",
                what, target, expr.ty
            ),
            expr.span,
        );
        expr
    }

    fn check_array_literal(&mut self, elements: &[ast::Expr], span: subc_util::Span) -> Expr {
        let elements: Vec<Expr> = elements.iter().map(|e| self.check_expr(e)).collect();

        if elements.is_empty() {
            self.error("cannot infer the element type of an empty array", span);
            return Expr {
                kind: ExprKind::Array(Vec::new()),
                ty: DataType::Array(Box::new(DataType::Unknown)),
                span,
            };
        }

        let mut elem_ty = elements[0].ty.clone();
        for element in &elements[1..] {
            if element.ty.is_unknown() || elem_ty.is_unknown() {
                elem_ty = DataType::Unknown;
                break;
            }
            if element.ty == elem_ty {
                continue;
            }
            match elem_ty.widen_numeric(&element.ty) {
                Some(widened) => elem_ty = widened,
                None => {
                    self.error(
                        format!(
                            "array elements must share one type, found {} and {}",
                            elem_ty, element.ty
                        ),
                        element.span,
                    );
                    elem_ty = DataType::Unknown;
                    break;
                }
            }
        }

        let elements = if elem_ty.is_unknown() {
            elements
        } else {
            elements
                .into_iter()
                .map(|e| self.coerce(e, &elem_ty, "array element"))
                .collect()
        };

        Expr {
            kind: ExprKind::Array(elements),
            ty: DataType::Array(Box::new(elem_ty)),
            span,
        }
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        lhs: &ast::Expr,
        rhs: &ast::Expr,
        span: subc_util::Span,
    ) -> Expr {
        let lhs = self.check_expr(lhs);
        let rhs = self.check_expr(rhs);

        if lhs.ty.is_unknown() || rhs.ty.is_unknown() {
            return self.recovery(span);
        }

        match op {
            // `+` with a string operand is concatenation; the other
            // operand is stringified by the runtime helper
            BinOp::Add if lhs.ty == DataType::String || rhs.ty == DataType::String => {
                for operand in [&lhs, &rhs] {
                    if !operand.ty.is_printable() {
                        self.error(
                            format!("cannot concatenate {} into a string", operand.ty),
                            operand.span,
                        );
                        return self.recovery(span);
                    }
                }
                Expr {
                    kind: ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ty: DataType::String,
                    span,
                }
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                match lhs.ty.widen_numeric(&rhs.ty) {
                    Some(result) => {
                        let lhs = self.coerce(lhs, &result, "operand");
                        let rhs = self.coerce(rhs, &result, "operand");
                        Expr {
                            kind: ExprKind::Binary {
                                op,
                                lhs: Box::new(lhs),
                                rhs: Box::new(rhs),
                            },
                            ty: result,
                            span,
                        }
                    }
                    None => {
                        self.error(
                            format!(
                                "operator `{}` requires numeric operands, found {} and {}",
                                op.as_str(),
                                lhs.ty,
                                rhs.ty
                            ),
                            span,
                        );
                        self.recovery(span)
                    }
                }
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let both_strings = lhs.ty == DataType::String && rhs.ty == DataType::String;
                if both_strings {
                    return Expr {
                        kind: ExprKind::Binary {
                            op,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        ty: DataType::Bool,
                        span,
                    };
                }
                match lhs.ty.widen_numeric(&rhs.ty) {
                    Some(operand_ty) => {
                        let lhs = self.coerce(lhs, &operand_ty, "operand");
                        let rhs = self.coerce(rhs, &operand_ty, "operand");
                        Expr {
                            kind: ExprKind::Binary {
                                op,
                                lhs: Box::new(lhs),
                                rhs: Box::new(rhs),
                            },
                            ty: DataType::Bool,
                            span,
                        }
                    }
                    None => {
                        self.error(
                            format!(
                                "comparison `{}` requires two numbers or two strings, \
                                 found {} and {}",
                                op.as_str(),
                                lhs.ty,
                                rhs.ty
                            ),
                            span,
                        );
                        self.recovery(span)
                    }
                }
            }
            BinOp::And | BinOp::Or => {
                for operand in [&lhs, &rhs] {
                    if operand.ty != DataType::Bool {
                        self.error(
                            format!(
                                "operator `{}` requires `bool` operands, found {}",
                                op.as_str(),
                                operand.ty
                            ),
                            operand.span,
                        );
                        return self.recovery(span);
                    }
                }
                Expr {
                    kind: ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ty: DataType::Bool,
                    span,
                }
            }
        }
    }

    fn check_unary(&mut self, op: UnOp, operand: &ast::Expr, span: subc_util::Span) -> Expr {
        let operand = self.check_expr(operand);
        if operand.ty.is_unknown() {
            return self.recovery(span);
        }

        let ty = match op {
            UnOp::Neg if operand.ty.is_numeric() => operand.ty.clone(),
            UnOp::Neg => {
                self.error(
                    format!("unary `-` requires a numeric operand, found {}", operand.ty),
                    span,
                );
                return self.recovery(span);
            }
            UnOp::Not if operand.ty == DataType::Bool => DataType::Bool,
            UnOp::Not => {
                self.error(
                    format!("unary `!` requires a `bool` operand, found {}", operand.ty),
                    span,
                );
                return self.recovery(span);
            }
        };

        Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            span,
        }
    }

    fn check_ternary(
        &mut self,
        cond: &ast::Expr,
        then_expr: &ast::Expr,
        else_expr: &ast::Expr,
        span: subc_util::Span,
    ) -> Expr {
        let cond = self.check_expr(cond);
        if cond.ty != DataType::Bool && !cond.ty.is_unknown() {
            self.error(
                format!("ternary condition must be `bool`, found {}", cond.ty),
                cond.span,
            );
        }

        let then_expr = self.check_expr(then_expr);
        let else_expr = self.check_expr(else_expr);
        if then_expr.ty.is_unknown() || else_expr.ty.is_unknown() {
            return self.recovery(span);
        }

        let ty = if then_expr.ty == else_expr.ty {
            then_expr.ty.clone()
        } else {
            match then_expr.ty.widen_numeric(&else_expr.ty) {
                Some(ty) => ty,
                None => {
                    self.error(
                        format!(
                            "ternary branches must have one type, found {} and {}",
                            then_expr.ty, else_expr.ty
                        ),
                        span,
                    );
                    return self.recovery(span);
                }
            }
        };

        let then_expr = self.coerce(then_expr, &ty, "ternary branch");
        let else_expr = self.coerce(else_expr, &ty, "ternary branch");
        Expr {
            kind: ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            ty,
            span,
        }
    }

    fn check_assign(
        &mut self,
        target: &ast::Expr,
        value: &ast::Expr,
        span: subc_util::Span,
    ) -> Expr {
        match &target.kind {
            ast::ExprKind::Ident(name) => {
                let Some(symbol) = self.scopes.resolve(*name).cloned() else {
                    self.error(format!("undeclared identifier `{}`", name), target.span);
                    self.check_expr(value);
                    return self.recovery(span);
                };
                if symbol.is_const {
                    self.error(
                        format!("cannot assign to constant `{}`", name),
                        target.span,
                    );
                }

                let value = self.check_expr(value);
                let value = self.coerce(value, &symbol.ty, "assignment");

                // Keep the static length current for `for x in arr`
                if matches!(symbol.ty, DataType::Array(_)) {
                    let new_len = match &value.kind {
                        crate::hir::ExprKind::Array(elements) => Some(elements.len()),
                        _ => None,
                    };
                    if let Some(tracked) = self.scopes.resolve_mut(*name) {
                        tracked.array_len = new_len;
                    }
                }

                let ty = symbol.ty.clone();
                Expr {
                    kind: ExprKind::Assign {
                        place: Place::Local(symbol.local, symbol.ty),
                        value: Box::new(value),
                    },
                    ty,
                    span,
                }
            }
            ast::ExprKind::Index { base, index } => {
                let base = self.check_expr(base);
                let index = self.check_expr(index);
                if index.ty != DataType::Int && !index.ty.is_unknown() {
                    self.error(
                        format!("array index must be `int`, found {}", index.ty),
                        index.span,
                    );
                }

                let elem_ty = match &base.ty {
                    DataType::Array(elem) => (**elem).clone(),
                    DataType::String => {
                        self.error("cannot assign into a string", base.span);
                        DataType::Unknown
                    }
                    DataType::Unknown => DataType::Unknown,
                    ty => {
                        self.error(format!("type {} cannot be indexed", ty), base.span);
                        DataType::Unknown
                    }
                };

                let value = self.check_expr(value);
                let value = self.coerce(value, &elem_ty, "assignment");
                let ty = if elem_ty.is_unknown() {
                    DataType::Unknown
                } else {
                    elem_ty.clone()
                };
                Expr {
                    kind: ExprKind::Assign {
                        place: Place::Elem {
                            base: Box::new(base),
                            index: Box::new(index),
                            elem_ty,
                        },
                        value: Box::new(value),
                    },
                    ty,
                    span,
                }
            }
            _ => {
                // The parser already rejects non-lvalues; this covers
                // recovery paths
                self.error("invalid assignment target", target.span);
                self.check_expr(value);
                self.recovery(span)
            }
        }
    }

    fn check_call(&mut self, callee: subc_util::Symbol, args: &[ast::Expr], span: subc_util::Span) -> Expr {
        // `print` is the built-in output statement
        if callee == kw::PRINT {
            if args.len() != 1 {
                self.error(
                    format!("`print` takes exactly one argument, found {}", args.len()),
                    span,
                );
                for arg in args {
                    self.check_expr(arg);
                }
                return self.recovery(span);
            }
            let arg = self.check_expr(&args[0]);
            if !arg.ty.is_printable() && !arg.ty.is_unknown() {
                self.error(format!("cannot print a value of type {}", arg.ty), arg.span);
            }
            return Expr {
                kind: ExprKind::Call {
                    callee,
                    args: vec![arg],
                },
                ty: DataType::Void,
                span,
            };
        }

        let Some(sig) = self.signatures.get(&callee).cloned() else {
            self.error(format!("call to undeclared function `{}`", callee), span);
            for arg in args {
                self.check_expr(arg);
            }
            return self.recovery(span);
        };

        if args.len() != sig.params.len() {
            self.error(
                format!(
                    "function `{}` expects {} argument(s), found {}",
                    callee,
                    sig.params.len(),
                    args.len()
                ),
                span,
            );
            for arg in args {
                self.check_expr(arg);
            }
            return self.recovery(span);
        }

        let args = args
            .iter()
            .zip(&sig.params)
            .map(|(arg, (param_name, param_ty, _))| {
                let arg = self.check_expr(arg);
                self.coerce(arg, param_ty, &format!("argument `{}`", param_name))
            })
            .collect();

        Expr {
            kind: ExprKind::Call { callee, args },
            ty: sig.ret_ty,
            span,
        }
    }

    fn check_index(&mut self, base: &ast::Expr, index: &ast::Expr, span: subc_util::Span) -> Expr {
        let base = self.check_expr(base);
        let index = self.check_expr(index);

        if index.ty != DataType::Int && !index.ty.is_unknown() {
            self.error(
                format!("array index must be `int`, found {}", index.ty),
                index.span,
            );
        }

        let ty = match &base.ty {
            DataType::Array(elem) => (**elem).clone(),
            // Indexing a string yields a one-character string
            DataType::String => DataType::String,
            DataType::Unknown => DataType::Unknown,
            ty => {
                self.error(format!("type {} cannot be indexed", ty), base.span);
                DataType::Unknown
            }
        };

        Expr {
            kind: ExprKind::Index {
                base: Box::new(base),
                index: Box::new(index),
            },
            ty,
            span,
        }
    }

    /// An error-recovery expression; analysis already reported why
    fn recovery(&self, span: subc_util::Span) -> Expr {
        Expr {
            kind: ExprKind::Int(0),
            ty: DataType::Unknown,
            span,
        }
    }
}
