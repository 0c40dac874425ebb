//! Typed HIR - the semantic analyzer's output.
//!
//! Every expression carries its final [`DataType`] and every variable
//! reference is resolved to a [`LocalId`]; the IR builder consumes this
//! tree without doing any name lookup or inference of its own. Numeric
//! widening is explicit ([`ExprKind::IntToFloat`]), so no later phase
//! re-derives coercions.

use subc_par::ast::{BinOp, UnOp};
use subc_util::{Span, Symbol};

use crate::types::DataType;

/// A function-local storage slot
///
/// Parameters occupy the first slots in declaration order; declared
/// variables (including loop induction variables) follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

impl LocalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A fully analyzed program
///
/// Functions appear in declaration order; the entry function `main`
/// (synthesized from top-level statements unless the user wrote one) is
/// always last.
#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    /// The entry function
    pub fn main(&self) -> Option<&Function> {
        self.functions.iter().find(|f| f.name.as_str() == "main")
    }
}

/// A typed function body
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub ret_ty: DataType,
    pub body: Vec<Stmt>,
    /// Total storage slots: parameters plus every declared variable
    pub local_count: usize,
    pub span: Span,
}

/// A typed parameter bound to its slot
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: DataType,
    pub local: LocalId,
    pub span: Span,
}

/// Typed statement
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Variable or constant declaration; constness was enforced during
    /// analysis and no longer matters here
    Local {
        local: LocalId,
        ty: DataType,
        init: Option<Expr>,
        span: Span,
    },
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        /// `elif` chains arrive as a single nested `If` here
        else_body: Vec<Stmt>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    /// Body runs once before the first condition check
    DoWhile {
        body: Vec<Stmt>,
        cond: Expr,
        span: Span,
    },
    /// `for var in range(start, end)`
    ForRange {
        var: LocalId,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    /// `for var in array` with a statically known length
    ForArray {
        var: LocalId,
        elem_ty: DataType,
        array: Expr,
        len: usize,
        body: Vec<Stmt>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    /// Standalone block; the scope it introduced is already resolved
    Block(Vec<Stmt>),
    /// Expression statement (calls, assignments, prints)
    Expr(Expr),
}

/// Typed expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: DataType,
    pub span: Span,
}

/// Typed expression kind
#[derive(Debug, Clone)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(Symbol),
    Bool(bool),
    /// `null`; always coerced, lowers to a zero pointer
    Null,
    /// Read of a resolved local slot
    Local(LocalId),
    Array(Vec<Expr>),
    /// Binary operation; `Add` on a `string`-typed node is
    /// concatenation
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// Assignment; yields the stored value
    Assign {
        place: Place,
        value: Box<Expr>,
    },
    /// Call of a user function, or of the built-in `print`
    Call {
        callee: Symbol,
        args: Vec<Expr>,
    },
    /// `base[index]`; string bases yield a one-character string
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// Explicit numeric widening inserted by the analyzer
    IntToFloat(Box<Expr>),
}

/// An assignable location
#[derive(Debug, Clone)]
pub enum Place {
    Local(LocalId, DataType),
    Elem {
        base: Box<Expr>,
        index: Box<Expr>,
        elem_ty: DataType,
    },
}

/// Walk every expression in a statement tree, outer nodes first
///
/// Used by the property tests that assert every node left the analyzer
/// with a concrete type.
pub fn visit_exprs<'a>(stmts: &'a [Stmt], visit: &mut impl FnMut(&'a Expr)) {
    fn walk_expr<'a>(expr: &'a Expr, visit: &mut impl FnMut(&'a Expr)) {
        visit(expr);
        match &expr.kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Local(_) => {}
            ExprKind::Array(elements) => {
                for element in elements {
                    walk_expr(element, visit);
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                walk_expr(lhs, visit);
                walk_expr(rhs, visit);
            }
            ExprKind::Unary { operand, .. } => walk_expr(operand, visit),
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                walk_expr(cond, visit);
                walk_expr(then_expr, visit);
                walk_expr(else_expr, visit);
            }
            ExprKind::Assign { place, value } => {
                if let Place::Elem { base, index, .. } = place {
                    walk_expr(base, visit);
                    walk_expr(index, visit);
                }
                walk_expr(value, visit);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    walk_expr(arg, visit);
                }
            }
            ExprKind::Index { base, index } => {
                walk_expr(base, visit);
                walk_expr(index, visit);
            }
            ExprKind::IntToFloat(inner) => walk_expr(inner, visit),
        }
    }

    for stmt in stmts {
        match stmt {
            Stmt::Local { init, .. } => {
                if let Some(init) = init {
                    walk_expr(init, visit);
                }
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                walk_expr(cond, visit);
                visit_exprs(then_body, visit);
                visit_exprs(else_body, visit);
            }
            Stmt::While { cond, body, .. } => {
                walk_expr(cond, visit);
                visit_exprs(body, visit);
            }
            Stmt::DoWhile { body, cond, .. } => {
                visit_exprs(body, visit);
                walk_expr(cond, visit);
            }
            Stmt::ForRange {
                start, end, body, ..
            } => {
                walk_expr(start, visit);
                walk_expr(end, visit);
                visit_exprs(body, visit);
            }
            Stmt::ForArray { array, body, .. } => {
                walk_expr(array, visit);
                visit_exprs(body, visit);
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    walk_expr(value, visit);
                }
            }
            Stmt::Break(_) | Stmt::Continue(_) => {}
            Stmt::Block(body) => visit_exprs(body, visit),
            Stmt::Expr(expr) => walk_expr(expr, visit),
        }
    }
}
