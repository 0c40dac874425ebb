//! The SB type system.

use std::fmt;

/// A type in the SB type system
///
/// `Unknown` and `Auto` exist only during analysis: `Unknown` is the
/// recovery type after an error, `Auto` the not-yet-inferred marker.
/// Neither survives on any expression of a successfully analyzed
/// program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// Recovery type; analysis already reported an error here
    Unknown,
    /// No value
    Void,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// Heap string (NUL-terminated at runtime)
    String,
    Bool,
    /// Array with a uniform element type
    Array(Box<DataType>),
    /// Reserved; no object values exist in v1
    Object,
    /// A function name
    Function,
    /// The type of the `null` literal
    Null,
    /// Written `auto`: infer from the initializer
    Auto,
}

impl DataType {
    /// True for `int` and `float`
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    /// True once an error was already reported for this expression
    pub fn is_unknown(&self) -> bool {
        matches!(self, DataType::Unknown)
    }

    /// Widen two numeric types: any float operand makes the result
    /// float
    pub fn widen_numeric(&self, other: &DataType) -> Option<DataType> {
        match (self, other) {
            (DataType::Int, DataType::Int) => Some(DataType::Int),
            (DataType::Int, DataType::Float)
            | (DataType::Float, DataType::Int)
            | (DataType::Float, DataType::Float) => Some(DataType::Float),
            _ => None,
        }
    }

    /// Types `null` may stand in for: those with a pointer
    /// representation
    pub fn accepts_null(&self) -> bool {
        matches!(self, DataType::String | DataType::Array(_) | DataType::Object)
    }

    /// Types the built-in `print` accepts
    pub fn is_printable(&self) -> bool {
        matches!(
            self,
            DataType::Int | DataType::Float | DataType::String | DataType::Bool
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Unknown => write!(f, "<unknown>"),
            DataType::Void => write!(f, "void"),
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::String => write!(f, "string"),
            DataType::Bool => write!(f, "bool"),
            DataType::Array(elem) => write!(f, "array of {}", elem),
            DataType::Object => write!(f, "object"),
            DataType::Function => write!(f, "function"),
            DataType::Null => write!(f, "null"),
            DataType::Auto => write!(f, "auto"),
        }
    }
}
