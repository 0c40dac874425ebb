//! IR model: values, instructions, functions, modules.
//!
//! The IR is a linear three-address form. Virtual registers are typed
//! and numbered by one monotonic counter per module, labels by
//! another; both are therefore unique within any function. Registers
//! are not single-assignment (loop counters are updated in place) but
//! every register is defined before its first use.

use std::fmt;

use indexmap::IndexMap;
use subc_sem::DataType;
use subc_util::{Span, Symbol};

/// Virtual register id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegId(pub u32);

/// Label id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);

/// String pool id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrId(pub u32);

/// A typed virtual register
#[derive(Debug, Clone, PartialEq)]
pub struct Reg {
    pub id: RegId,
    pub ty: DataType,
}

impl Reg {
    pub fn new(id: RegId, ty: DataType) -> Self {
        Self { id, ty }
    }
}

/// An instruction operand
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String pool constant
    Str(StrId),
    /// Virtual register
    Reg(Reg),
}

impl Value {
    /// The operand's type
    pub fn ty(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Str(_) => DataType::String,
            Value::Reg(reg) => reg.ty.clone(),
        }
    }
}

/// Three-address ALU opcodes sharing the `dst, lhs, rhs` shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// The opcode mnemonic used by the stable IR rendering
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "ADD",
            BinaryOp::Sub => "SUB",
            BinaryOp::Mul => "MUL",
            BinaryOp::Div => "DIV",
            BinaryOp::Mod => "MOD",
            BinaryOp::Eq => "EQ",
            BinaryOp::Ne => "NE",
            BinaryOp::Lt => "LT",
            BinaryOp::Le => "LE",
            BinaryOp::Gt => "GT",
            BinaryOp::Ge => "GE",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    /// True for the six comparison opcodes
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// Instruction kinds
///
/// One variant per opcode of the instruction set; the ALU opcodes
/// share the `Binary` payload shape.
#[derive(Debug, Clone)]
pub enum InstKind {
    /// ADD/SUB/MUL/DIV/MOD, EQ/NE/LT/LE/GT/GE, AND/OR
    Binary {
        op: BinaryOp,
        dst: Reg,
        lhs: Value,
        rhs: Value,
    },
    /// Boolean NOT
    Not { dst: Reg, src: Value },
    /// Read a local slot into a register
    Load { dst: Reg, local: u32 },
    /// Write a register (or literal) into a local slot
    Store { src: Value, local: u32 },
    /// Register-to-register move; converts int to float when the
    /// destination register is float-typed
    Move { dst: Reg, src: Value },
    ConstInt { dst: Reg, value: i64 },
    ConstFloat { dst: Reg, value: f64 },
    ConstString { dst: Reg, id: StrId },
    /// Heap-allocate `count` 8-byte elements
    Alloc { dst: Reg, count: Value },
    Label(LabelId),
    Jump(LabelId),
    JumpIf { cond: Value, target: LabelId },
    JumpIfNot { cond: Value, target: LabelId },
    /// Call a user function or runtime helper
    Call {
        dst: Option<Reg>,
        callee: Symbol,
        args: Vec<Value>,
    },
    Return { value: Option<Value> },
    FuncStart { name: Symbol },
    FuncEnd,
    /// Move argument `index` into its local slot (prologue only)
    Param { index: usize, local: u32 },
    /// Built-in print; the type picks the format string
    Print { value: Value, ty: DataType },
    /// Read an 8-byte element: `dst = base[index]`
    LoadElem {
        dst: Reg,
        base: Value,
        index: Value,
    },
    /// Write an 8-byte element: `base[index] = value`
    StoreElem {
        base: Value,
        index: Value,
        value: Value,
    },
}

/// An instruction with its source location
#[derive(Debug, Clone)]
pub struct Inst {
    pub kind: InstKind,
    pub span: Span,
    pub comment: Option<String>,
}

impl Inst {
    pub fn new(kind: InstKind, span: Span) -> Self {
        Self {
            kind,
            span,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One lowered function
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub ret_ty: DataType,
    pub params: Vec<(Symbol, DataType)>,
    pub insts: Vec<Inst>,
    /// Virtual registers allocated while lowering this function
    pub reg_count: u32,
    /// Local slots (parameters included)
    pub local_count: usize,
}

/// A lowered module
#[derive(Debug, Clone)]
pub struct Module {
    pub functions: Vec<Function>,
    pub strings: StringPool,
    /// Entry-point function name; always `main`
    pub entry: Symbol,
}

/// The module-wide string literal table
///
/// Distinct literals get sequential ids; iteration is insertion order,
/// so emitted assembly is deterministic.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    pool: IndexMap<String, StrId>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a literal, returning its stable id
    pub fn intern(&mut self, text: &str) -> StrId {
        if let Some(id) = self.pool.get(text) {
            return *id;
        }
        let id = StrId(self.pool.len() as u32);
        self.pool.insert(text.to_owned(), id);
        id
    }

    /// Look up a literal by id
    pub fn get(&self, id: StrId) -> Option<&str> {
        self.pool
            .get_index(id.0 as usize)
            .map(|(text, _)| text.as_str())
    }

    /// All literals in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (StrId, &str)> {
        self.pool.iter().map(|(text, id)| (*id, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{:?}", value),
            Value::Str(id) => write!(f, "str{}", id.0),
            Value::Reg(reg) => write!(f, "r{}", reg.id.0),
        }
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_pool_dedup() {
        let mut pool = StringPool::new();
        let a = pool.intern("hello");
        let b = pool.intern("world");
        let c = pool.intern("hello");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(a), Some("hello"));
        assert_eq!(pool.get(b), Some("world"));
    }

    #[test]
    fn test_string_pool_insertion_order() {
        let mut pool = StringPool::new();
        pool.intern("b");
        pool.intern("a");
        pool.intern("c");
        let texts: Vec<_> = pool.iter().map(|(_, text)| text).collect();
        assert_eq!(texts, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Int(1).ty(), DataType::Int);
        assert_eq!(Value::Float(1.0).ty(), DataType::Float);
        assert_eq!(Value::Str(StrId(0)).ty(), DataType::String);
        assert_eq!(
            Value::Reg(Reg::new(RegId(3), DataType::Bool)).ty(),
            DataType::Bool
        );
    }
}
