//! String interning.
//!
//! All identifiers, keywords, and string-literal payloads in the
//! compiler are [`Symbol`]s: 4-byte indices into a global string table.
//! Equality and hashing are integer operations; the text itself is
//! stored once and lives for the whole process.
//!
//! SB keywords are pre-interned at table construction so they occupy a
//! stable, known range of indices and can be exposed as constants in
//! [`kw`].
//!
//! # Examples
//!
//! ```
//! use subc_util::{kw, Symbol};
//!
//! let a = Symbol::intern("counter");
//! let b = Symbol::intern("counter");
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "counter");
//! assert_eq!(kw::VAR.as_str(), "var");
//! ```

mod interner;

use std::fmt;

use interner::table;
use static_assertions::const_assert_eq;

/// An interned string
///
/// Symbols are cheap to copy and compare; two symbols are equal exactly
/// when their texts are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    index: u32,
}

const_assert_eq!(std::mem::size_of::<Symbol>(), 4);

impl Symbol {
    /// Intern a string, returning its symbol
    pub fn intern(text: &str) -> Symbol {
        table().intern(text)
    }

    /// The interned text
    pub fn as_str(self) -> &'static str {
        table().resolve(self)
    }

    /// Raw table index
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Construct a symbol from a known table index
    ///
    /// Only used for the pre-interned keyword constants below; the index
    /// must match the interner's initialization order.
    const fn from_index(index: u32) -> Symbol {
        Symbol { index }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-interned SB keywords and well-known names
///
/// Indices mirror `PREINTERNED` in the interner module; the two lists
/// must stay in the same order.
pub mod kw {
    use super::Symbol;

    pub const VAR: Symbol = Symbol::from_index(0);
    pub const CONST: Symbol = Symbol::from_index(1);
    pub const FUNCTION: Symbol = Symbol::from_index(2);
    pub const RETURN: Symbol = Symbol::from_index(3);
    pub const IF: Symbol = Symbol::from_index(4);
    pub const ELIF: Symbol = Symbol::from_index(5);
    pub const ELSE: Symbol = Symbol::from_index(6);
    pub const FOR: Symbol = Symbol::from_index(7);
    pub const WHILE: Symbol = Symbol::from_index(8);
    pub const DO: Symbol = Symbol::from_index(9);
    pub const BREAK: Symbol = Symbol::from_index(10);
    pub const CONTINUE: Symbol = Symbol::from_index(11);
    pub const END: Symbol = Symbol::from_index(12);
    pub const TRUE: Symbol = Symbol::from_index(13);
    pub const FALSE: Symbol = Symbol::from_index(14);
    pub const NULL: Symbol = Symbol::from_index(15);
    pub const IN: Symbol = Symbol::from_index(16);
    pub const AND: Symbol = Symbol::from_index(17);
    pub const OR: Symbol = Symbol::from_index(18);
    pub const NOT: Symbol = Symbol::from_index(19);
    pub const INT: Symbol = Symbol::from_index(20);
    pub const FLOAT: Symbol = Symbol::from_index(21);
    pub const STRING: Symbol = Symbol::from_index(22);
    pub const BOOL: Symbol = Symbol::from_index(23);
    pub const VOID: Symbol = Symbol::from_index(24);
    pub const AUTO: Symbol = Symbol::from_index(25);

    // Well-known non-keyword names
    pub const MAIN: Symbol = Symbol::from_index(26);
    pub const RANGE: Symbol = Symbol::from_index(27);
    pub const PRINT: Symbol = Symbol::from_index(28);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let a = Symbol::intern("hello");
        let b = Symbol::intern("hello");
        let c = Symbol::intern("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "hello");
        assert_eq!(c.as_str(), "world");
    }

    #[test]
    fn test_keywords_preinterned() {
        assert_eq!(kw::VAR, Symbol::intern("var"));
        assert_eq!(kw::FUNCTION, Symbol::intern("function"));
        assert_eq!(kw::ELIF, Symbol::intern("elif"));
        assert_eq!(kw::AUTO, Symbol::intern("auto"));
        assert_eq!(kw::PRINT, Symbol::intern("print"));
        assert_eq!(kw::PRINT.as_str(), "print");
    }

    #[test]
    fn test_display() {
        let s = Symbol::intern("xyz");
        assert_eq!(format!("{}", s), "xyz");
        assert_eq!(format!("{:?}", s), "Symbol(\"xyz\")");
    }
}
