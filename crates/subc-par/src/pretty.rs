//! AST pretty-printer.
//!
//! Renders an AST back to SB surface syntax in a canonical form: brace
//! blocks, four-space indentation, one statement per line, and fully
//! parenthesized expressions. Re-parsing the output yields a
//! structurally identical AST, which is what the parser round-trip
//! test relies on.

use crate::ast::*;

/// Render a whole program
pub fn program_to_string(ast: &Ast) -> String {
    let mut printer = Printer::new();
    for stmt in ast {
        printer.stmt(stmt);
    }
    printer.out
}

/// Render a single expression (fully parenthesized)
pub fn expr_to_string(expr: &Expr) -> String {
    let mut printer = Printer::new();
    printer.expr(expr);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn stmt(&mut self, stmt: &Stmt) {
        self.line_start();
        match stmt {
            Stmt::Var(decl) => {
                self.push("var ");
                self.push(decl.name.as_str());
                if let Some(ty) = decl.ty {
                    self.push(": ");
                    self.push(ty.kind.as_str());
                }
                if let Some(init) = &decl.init {
                    self.push(" = ");
                    self.expr(init);
                }
            }
            Stmt::Const(decl) => {
                self.push("const ");
                self.push(decl.name.as_str());
                if let Some(ty) = decl.ty {
                    self.push(": ");
                    self.push(ty.kind.as_str());
                }
                self.push(" = ");
                self.expr(&decl.init);
            }
            Stmt::Function(func) => {
                self.push("function ");
                self.push(func.name.as_str());
                self.push("(");
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(param.name.as_str());
                    if let Some(ty) = param.ty {
                        self.push(": ");
                        self.push(ty.kind.as_str());
                    }
                }
                self.push(")");
                if let Some(ty) = func.ret_ty {
                    self.push(": ");
                    self.push(ty.kind.as_str());
                }
                self.push(" ");
                self.block(&func.body);
            }
            Stmt::If(if_stmt) => self.if_chain(if_stmt, "if"),
            Stmt::While(while_stmt) => {
                self.push("while ");
                self.expr(&while_stmt.cond);
                self.push(" ");
                self.block(&while_stmt.body);
            }
            Stmt::DoWhile(dw) => {
                self.push("do ");
                self.block(&dw.body);
                self.push(" while ");
                self.expr(&dw.cond);
            }
            Stmt::For(for_stmt) => {
                self.push("for ");
                self.push(for_stmt.var.as_str());
                self.push(" in ");
                match &for_stmt.iter {
                    ForIter::Range { start, end, .. } => {
                        self.push("range(");
                        if let Some(start) = start {
                            self.expr(start);
                            self.push(", ");
                        }
                        self.expr(end);
                        self.push(")");
                    }
                    ForIter::Collection(expr) => self.expr(expr),
                }
                self.push(" ");
                self.block(&for_stmt.body);
            }
            Stmt::Return(ret) => {
                self.push("return");
                if let Some(value) = &ret.value {
                    self.push(" ");
                    self.expr(value);
                }
            }
            Stmt::Break(_) => self.push("break"),
            Stmt::Continue(_) => self.push("continue"),
            Stmt::Block(block) => self.block(block),
            Stmt::Expr(expr) => self.expr(expr),
        }
        self.push("\n");
    }

    fn if_chain(&mut self, if_stmt: &IfStmt, keyword: &str) {
        self.push(keyword);
        self.push(" ");
        self.expr(&if_stmt.cond);
        self.push(" ");
        self.block(&if_stmt.then_block);
        match if_stmt.else_arm.as_deref() {
            Some(ElseArm::Elif(elif)) => {
                self.push(" ");
                self.if_chain(elif, "elif");
            }
            Some(ElseArm::Else(block)) => {
                self.push(" else ");
                self.block(block);
            }
            None => {}
        }
    }

    fn block(&mut self, block: &Block) {
        self.push("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.line_start();
        self.push("}");
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Int(value) => self.push(&value.to_string()),
            ExprKind::Float(value) => {
                // Always keep a decimal point so the literal re-lexes
                // as a float
                let text = if value.fract() == 0.0 && value.is_finite() {
                    format!("{:.1}", value)
                } else {
                    format!("{}", value)
                };
                self.push(&text);
            }
            ExprKind::Str(value) => {
                self.push("\"");
                for c in value.as_str().chars() {
                    match c {
                        '\n' => self.push("\\n"),
                        '\t' => self.push("\\t"),
                        '\r' => self.push("\\r"),
                        '\\' => self.push("\\\\"),
                        '"' => self.push("\\\""),
                        c => self.out.push(c),
                    }
                }
                self.push("\"");
            }
            ExprKind::Bool(true) => self.push("true"),
            ExprKind::Bool(false) => self.push("false"),
            ExprKind::Null => self.push("null"),
            ExprKind::Ident(name) => self.push(name.as_str()),
            ExprKind::Array(elements) => {
                self.push("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(element);
                }
                self.push("]");
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.push("(");
                self.expr(lhs);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(rhs);
                self.push(")");
            }
            ExprKind::Unary { op, operand } => {
                self.push("(");
                self.push(op.as_str());
                self.expr(operand);
                self.push(")");
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.push("(");
                self.expr(cond);
                self.push(" ? ");
                self.expr(then_expr);
                self.push(" : ");
                self.expr(else_expr);
                self.push(")");
            }
            ExprKind::Assign { target, value } => {
                // Parenthesized like the other operators: assignment
                // can sit inside a larger expression
                self.push("(");
                self.expr(target);
                self.push(" = ");
                self.expr(value);
                self.push(")");
            }
            ExprKind::Call { callee, args } => {
                self.push(callee.as_str());
                self.push("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(arg);
                }
                self.push(")");
            }
            ExprKind::Index { base, index } => {
                self.expr(base);
                self.push("[");
                self.expr(index);
                self.push("]");
            }
            ExprKind::Member { base, field } => {
                self.expr(base);
                self.push(".");
                self.push(field.as_str());
            }
        }
    }
}
