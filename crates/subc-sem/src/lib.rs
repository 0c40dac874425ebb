//! subc-sem - Semantic Analyzer & Type Checker
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The analyzer walks the AST and answers the questions syntax cannot:
//! is this name declared, do these types fit, is this `break` inside a
//! loop. Its output is a typed HIR ([`hir`]) in which every expression
//! carries a concrete [`DataType`] (never `unknown`, never `auto`) and
//! every variable reference is resolved to a function-local storage
//! slot. The IR builder consumes that tree without doing any name
//! lookup of its own.
//!
//! ============================================================================
//! NAME RESOLUTION
//! ============================================================================
//!
//! Scopes are lexical and stack-shaped. The program introduces the
//! global scope; every block pushes one more; a function declaration
//! starts a fresh stack containing only its parameters (function bodies
//! do not see top-level variables, which live in the synthesized
//! `main`'s frame). Shadowing across scopes is allowed; re-declaring a
//! name within one scope is an error. Function names live in a
//! separate module-level table collected in a first pass, so calls may
//! precede declarations textually.
//!
//! Top-level non-function statements become the body of a synthesized
//! `main: int`. A user-written `function main` is accepted only when
//! the program has no top-level executable statements.
//!
//! ============================================================================
//! TYPE RULES
//! ============================================================================
//!
//! - Arithmetic needs numeric operands and widens `int` to `float`;
//!   the widening is an explicit `IntToFloat` node in the output.
//! - `+` with a string operand concatenates; the other side must be
//!   printable and is converted to text at emission time.
//! - Comparisons need two numbers or two strings and yield `bool`.
//! - `&& || and or not !` work on `bool` only.
//! - Conditions of `if`/`while`/`do`/`for` must be `bool`.
//! - Assignment matches the declared type, rejects `const` targets,
//!   and yields the stored value.
//! - Calls check arity and each argument against the parameter type.
//! - `return` matches the enclosing function's return type.
//! - Array literals unify their element types (with widening); `a[i]`
//!   needs an array or string base and an `int` index.
//!
//! Diagnostics accumulate to the end of the phase so one run surfaces
//! as many errors as possible; the driver refuses to lower when any
//! error was recorded. On an error the offending expression gets the
//! recovery type `unknown`, which suppresses cascading complaints.

pub mod hir;
mod infer;
pub mod scope;
pub mod types;

pub use types::DataType;

use rustc_hash::FxHashMap;
use subc_par::ast;
use subc_util::{kw, DiagnosticBuilder, Handler, Span, Symbol};

use crate::hir::LocalId;
use crate::scope::{ScopeStack, VarSymbol};

/// A function's callable interface, collected before bodies are
/// checked
#[derive(Debug, Clone)]
pub struct FnSig {
    pub name: Symbol,
    pub params: Vec<(Symbol, DataType, Span)>,
    pub ret_ty: DataType,
    pub span: Span,
}

/// Analyze a program: the convenience entry point the driver uses
pub fn analyze(ast: &ast::Ast, handler: &Handler) -> hir::Program {
    SemanticAnalyzer::new(handler).analyze(ast)
}

/// The semantic analysis pass
pub struct SemanticAnalyzer<'a> {
    handler: &'a Handler,
    /// Module-level function table
    pub(crate) signatures: FxHashMap<Symbol, FnSig>,
    /// Variable scopes of the function currently being checked
    pub(crate) scopes: ScopeStack,
    /// Return type of the enclosing function
    pub(crate) current_ret: DataType,
    /// True inside `main` (a bare `return` means `return 0` there)
    pub(crate) in_main: bool,
    /// Nesting depth of loops, for break/continue checking
    pub(crate) loop_depth: usize,
    /// Next free storage slot in the current function
    next_local: u32,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        Self {
            handler,
            signatures: FxHashMap::default(),
            scopes: ScopeStack::new(),
            current_ret: DataType::Void,
            in_main: false,
            loop_depth: 0,
            next_local: 0,
        }
    }

    /// Analyze a whole program into typed HIR
    pub fn analyze(&mut self, ast: &ast::Ast) -> hir::Program {
        self.collect_signatures(ast);

        let mut decls = Vec::new();
        let mut top_stmts = Vec::new();
        for stmt in ast {
            match stmt {
                ast::Stmt::Function(func) => decls.push(func),
                other => top_stmts.push(other),
            }
        }

        let user_main = self.signatures.get(&kw::MAIN).map(|sig| sig.span);
        if let Some(main_span) = user_main {
            if !top_stmts.is_empty() {
                self.error(
                    "a program cannot have both a `main` function and top-level statements",
                    main_span,
                );
            }
        }

        let mut functions: Vec<hir::Function> = decls
            .iter()
            .copied()
            .map(|func| self.check_function(func))
            .collect();

        if user_main.is_none() {
            functions.push(self.synthesize_main(&top_stmts));
        }

        hir::Program { functions }
    }

    /// First pass: record every function's signature so calls may
    /// precede declarations
    fn collect_signatures(&mut self, ast: &ast::Ast) {
        for stmt in ast {
            let ast::Stmt::Function(func) = stmt else {
                continue;
            };

            let mut params = Vec::new();
            for param in &func.params {
                let ty = match param.ty {
                    Some(ty) if ty.kind != ast::TypeNameKind::Auto => self.ast_type(ty),
                    _ => {
                        self.error(
                            format!("parameter `{}` needs a type annotation", param.name),
                            param.span,
                        );
                        DataType::Int
                    }
                };
                params.push((param.name, ty, param.span));
            }

            let ret_ty = match func.ret_ty {
                Some(ty) if ty.kind == ast::TypeNameKind::Auto => {
                    self.error("function return type cannot be `auto`", ty.span);
                    DataType::Void
                }
                Some(ty) => self.ast_type(ty),
                None => DataType::Void,
            };

            if let Some(existing) = self.signatures.get(&func.name) {
                let first_line = existing.span.line;
                self.handler.emit_diagnostic(
                    DiagnosticBuilder::error(format!(
                        "function `{}` is already defined",
                        func.name
                    ))
                    .span(func.span)
                    .note(format!("first definition is on line {}", first_line))
                    .build(),
                );
                continue;
            }

            self.signatures.insert(
                func.name,
                FnSig {
                    name: func.name,
                    params,
                    ret_ty,
                    span: func.span,
                },
            );
        }
    }

    /// Check one declared function
    fn check_function(&mut self, func: &ast::FunctionDecl) -> hir::Function {
        self.next_local = 0;
        self.scopes = ScopeStack::new();
        self.scopes.push(); // parameter scope
        self.loop_depth = 0;

        let sig = self.signatures.get(&func.name).cloned();
        let (param_types, ret_ty) = match sig {
            Some(sig) => (sig.params, sig.ret_ty),
            // Signature collection refused this function (duplicate
            // name); check the body against locally derived types so
            // its errors still surface
            None => (
                func.params
                    .iter()
                    .map(|p| {
                        let ty = p.ty.map(|t| self.ast_type(t)).unwrap_or(DataType::Int);
                        (p.name, ty, p.span)
                    })
                    .collect(),
                func.ret_ty.map(|t| self.ast_type(t)).unwrap_or(DataType::Void),
            ),
        };

        let mut params = Vec::new();
        for (name, ty, span) in param_types {
            let local = self.alloc_local();
            if let Err(previous) = self.scopes.declare(
                name,
                VarSymbol {
                    ty: ty.clone(),
                    is_const: false,
                    local,
                    decl_span: span,
                    array_len: None,
                },
            ) {
                self.redeclaration_error(name, span, previous);
            }
            params.push(hir::Param {
                name,
                ty,
                local,
                span,
            });
        }

        self.current_ret = ret_ty.clone();
        self.in_main = func.name == kw::MAIN;
        let body = self.check_block(&func.body);
        self.scopes.pop();

        hir::Function {
            name: func.name,
            params,
            ret_ty,
            body,
            local_count: self.next_local as usize,
            span: func.span,
        }
    }

    /// Build `main` from the top-level statements
    fn synthesize_main(&mut self, top_stmts: &[&ast::Stmt]) -> hir::Function {
        self.next_local = 0;
        self.scopes = ScopeStack::new();
        self.scopes.push(); // global scope
        self.loop_depth = 0;
        self.current_ret = DataType::Int;
        self.in_main = true;

        let body = top_stmts
            .iter()
            .copied()
            .filter_map(|stmt| self.check_stmt(stmt))
            .collect();
        self.scopes.pop();

        hir::Function {
            name: kw::MAIN,
            params: Vec::new(),
            ret_ty: DataType::Int,
            body,
            local_count: self.next_local as usize,
            span: Span::DUMMY,
        }
    }

    /// Check a block, giving it its own scope
    pub(crate) fn check_block(&mut self, block: &ast::Block) -> Vec<hir::Stmt> {
        self.scopes.push();
        let stmts = block
            .stmts
            .iter()
            .filter_map(|stmt| self.check_stmt(stmt))
            .collect();
        self.scopes.pop();
        stmts
    }

    /// Check one statement
    fn check_stmt(&mut self, stmt: &ast::Stmt) -> Option<hir::Stmt> {
        match stmt {
            ast::Stmt::Var(decl) => {
                self.check_decl(decl.name, decl.ty, decl.init.as_ref(), false, decl.span)
            }
            ast::Stmt::Const(decl) => {
                self.check_decl(decl.name, decl.ty, Some(&decl.init), true, decl.span)
            }
            ast::Stmt::Function(func) => {
                self.error("nested function declarations are not supported", func.span);
                None
            }
            ast::Stmt::If(if_stmt) => Some(self.check_if(if_stmt)),
            ast::Stmt::While(while_stmt) => {
                let cond = self.check_condition(&while_stmt.cond, "while");
                let body = self.check_loop_body(&while_stmt.body);
                Some(hir::Stmt::While {
                    cond,
                    body,
                    span: while_stmt.span,
                })
            }
            ast::Stmt::DoWhile(dw) => {
                let body = self.check_loop_body(&dw.body);
                let cond = self.check_condition(&dw.cond, "do-while");
                Some(hir::Stmt::DoWhile {
                    body,
                    cond,
                    span: dw.span,
                })
            }
            ast::Stmt::For(for_stmt) => self.check_for(for_stmt),
            ast::Stmt::Return(ret) => self.check_return(ret),
            ast::Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    self.error("`break` outside of a loop", *span);
                }
                Some(hir::Stmt::Break(*span))
            }
            ast::Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    self.error("`continue` outside of a loop", *span);
                }
                Some(hir::Stmt::Continue(*span))
            }
            ast::Stmt::Block(block) => Some(hir::Stmt::Block(self.check_block(block))),
            ast::Stmt::Expr(expr) => Some(hir::Stmt::Expr(self.check_expr(expr))),
        }
    }

    /// Shared path for `var` and `const` declarations
    fn check_decl(
        &mut self,
        name: Symbol,
        annotation: Option<ast::TypeName>,
        init: Option<&ast::Expr>,
        is_const: bool,
        span: Span,
    ) -> Option<hir::Stmt> {
        let declared = annotation.map(|ty| self.ast_type(ty));
        let init = init.map(|expr| self.check_expr(expr));

        let (ty, init) = match (declared, init) {
            (Some(ty), Some(init)) if ty != DataType::Auto => {
                let init = self.coerce(init, &ty, "initializer");
                (ty, Some(init))
            }
            (_, Some(init)) => {
                // No annotation, or explicit `auto`
                let ty = match &init.ty {
                    DataType::Null => {
                        self.error(
                            format!("cannot infer a type for `{}` from `null`", name),
                            span,
                        );
                        DataType::Unknown
                    }
                    DataType::Void => {
                        self.error(
                            format!("initializer of `{}` has no value", name),
                            init.span,
                        );
                        DataType::Unknown
                    }
                    ty => ty.clone(),
                };
                (ty, Some(init))
            }
            (Some(ty), None) => {
                if ty == DataType::Void || ty == DataType::Auto {
                    self.error(
                        format!("variable `{}` needs a type annotation or an initializer", name),
                        span,
                    );
                    (DataType::Unknown, None)
                } else {
                    (ty, None)
                }
            }
            (None, None) => {
                self.error(
                    format!("variable `{}` needs a type annotation or an initializer", name),
                    span,
                );
                (DataType::Unknown, None)
            }
        };

        let array_len = match init.as_ref().map(|e| &e.kind) {
            Some(hir::ExprKind::Array(elements)) => Some(elements.len()),
            _ => None,
        };

        let local = self.alloc_local();
        if let Err(previous) = self.scopes.declare(
            name,
            VarSymbol {
                ty: ty.clone(),
                is_const,
                local,
                decl_span: span,
                array_len,
            },
        ) {
            self.redeclaration_error(name, span, previous);
            return None;
        }

        Some(hir::Stmt::Local {
            local,
            ty,
            init,
            span,
        })
    }

    /// Check an if chain, normalizing `elif` into a nested else body
    fn check_if(&mut self, if_stmt: &ast::IfStmt) -> hir::Stmt {
        let cond = self.check_condition(&if_stmt.cond, "if");
        let then_body = self.check_block(&if_stmt.then_block);
        let else_body = match if_stmt.else_arm.as_deref() {
            None => Vec::new(),
            Some(ast::ElseArm::Elif(elif)) => vec![self.check_if(elif)],
            Some(ast::ElseArm::Else(block)) => self.check_block(block),
        };
        hir::Stmt::If {
            cond,
            then_body,
            else_body,
            span: if_stmt.span,
        }
    }

    /// Check a for statement (range or collection form)
    fn check_for(&mut self, for_stmt: &ast::ForStmt) -> Option<hir::Stmt> {
        match &for_stmt.iter {
            ast::ForIter::Range { start, end, span } => {
                let start = match start {
                    Some(expr) => self.check_int_bound(expr),
                    None => hir::Expr {
                        kind: hir::ExprKind::Int(0),
                        ty: DataType::Int,
                        span: *span,
                    },
                };
                let end = self.check_int_bound(end);

                self.scopes.push();
                let var = self.declare_induction_var(for_stmt.var, DataType::Int, for_stmt.span);
                let body = self.check_loop_body(&for_stmt.body);
                self.scopes.pop();

                Some(hir::Stmt::ForRange {
                    var,
                    start,
                    end,
                    body,
                    span: for_stmt.span,
                })
            }
            ast::ForIter::Collection(collection) => {
                let len = self.static_array_len(collection);
                let array = self.check_expr(collection);
                let elem_ty = match &array.ty {
                    DataType::Array(elem) => (**elem).clone(),
                    DataType::Unknown => DataType::Unknown,
                    ty => {
                        self.error(
                            format!("`for` can only iterate arrays, found {}", ty),
                            array.span,
                        );
                        DataType::Unknown
                    }
                };

                let Some(len) = len else {
                    if matches!(array.ty, DataType::Array(_)) {
                        self.error(
                            "cannot determine this collection's length; \
                             only arrays of known length can be iterated",
                            array.span,
                        );
                    }
                    return None;
                };

                self.scopes.push();
                let var = self.declare_induction_var(for_stmt.var, elem_ty.clone(), for_stmt.span);
                let body = self.check_loop_body(&for_stmt.body);
                self.scopes.pop();

                Some(hir::Stmt::ForArray {
                    var,
                    elem_ty,
                    array,
                    len,
                    body,
                    span: for_stmt.span,
                })
            }
        }
    }

    /// The statically known element count of a collection expression
    ///
    /// Known for an array literal, and for a variable whose tracked
    /// value is still an array literal.
    fn static_array_len(&self, collection: &ast::Expr) -> Option<usize> {
        match &collection.kind {
            ast::ExprKind::Array(elements) => Some(elements.len()),
            ast::ExprKind::Ident(name) => self.scopes.resolve(*name)?.array_len,
            _ => None,
        }
    }

    fn declare_induction_var(&mut self, name: Symbol, ty: DataType, span: Span) -> LocalId {
        let local = self.alloc_local();
        if let Err(previous) = self.scopes.declare(
            name,
            VarSymbol {
                ty,
                is_const: false,
                local,
                decl_span: span,
                array_len: None,
            },
        ) {
            self.redeclaration_error(name, span, previous);
        }
        local
    }

    /// Check a loop body, tracking nesting for break/continue
    fn check_loop_body(&mut self, block: &ast::Block) -> Vec<hir::Stmt> {
        self.loop_depth += 1;
        let body = self.check_block(block);
        self.loop_depth -= 1;
        body
    }

    /// Check a return statement against the enclosing function
    fn check_return(&mut self, ret: &ast::ReturnStmt) -> Option<hir::Stmt> {
        let value = ret.value.as_ref().map(|expr| self.check_expr(expr));
        let value = match (value, &self.current_ret) {
            (None, DataType::Void) => None,
            // A bare `return` in main means `return 0`
            (None, DataType::Int) if self.in_main => None,
            (None, ret_ty) => {
                self.error(
                    format!("missing return value: this function returns {}", ret_ty),
                    ret.span,
                );
                None
            }
            (Some(value), DataType::Void) => {
                self.error("cannot return a value from a void function", value.span);
                Some(value)
            }
            (Some(value), _) => {
                let ret_ty = self.current_ret.clone();
                Some(self.coerce(value, &ret_ty, "return value"))
            }
        };
        Some(hir::Stmt::Return {
            value,
            span: ret.span,
        })
    }

    /// Check a loop/branch condition and require `bool`
    pub(crate) fn check_condition(&mut self, cond: &ast::Expr, construct: &str) -> hir::Expr {
        let cond = self.check_expr(cond);
        if cond.ty != DataType::Bool && !cond.ty.is_unknown() {
            self.error(
                format!(
                    "`{}` condition must be `bool`, found {}",
                    construct, cond.ty
                ),
                cond.span,
            );
        }
        cond
    }

    /// Check a range bound and require `int`
    fn check_int_bound(&mut self, expr: &ast::Expr) -> hir::Expr {
        let bound = self.check_expr(expr);
        if bound.ty != DataType::Int && !bound.ty.is_unknown() {
            self.error(
                format!("range bounds must be `int`, found {}", bound.ty),
                bound.span,
            );
        }
        bound
    }

    /// Map a written type name to a data type
    fn ast_type(&mut self, ty: ast::TypeName) -> DataType {
        match ty.kind {
            ast::TypeNameKind::Int => DataType::Int,
            ast::TypeNameKind::Float => DataType::Float,
            ast::TypeNameKind::String => DataType::String,
            ast::TypeNameKind::Bool => DataType::Bool,
            ast::TypeNameKind::Void => DataType::Void,
            ast::TypeNameKind::Auto => DataType::Auto,
        }
    }

    pub(crate) fn alloc_local(&mut self) -> LocalId {
        let local = LocalId(self.next_local);
        self.next_local += 1;
        local
    }

    fn redeclaration_error(&mut self, name: Symbol, span: Span, previous: Span) {
        self.handler.emit_diagnostic(
            DiagnosticBuilder::error(format!(
                "`{}` is already declared in this scope",
                name
            ))
            .span(span)
            .note(format!("previous declaration is on line {}", previous.line))
            .build(),
        );
    }

    pub(crate) fn error(&mut self, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }
}
