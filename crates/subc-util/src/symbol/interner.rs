//! String table implementation backing [`Symbol`](super::Symbol).
//!
//! The table is global, initialized on first use via `LazyLock`, and
//! append-only: interned strings are leaked to obtain `'static`
//! references, which is safe because the table lives for the entire
//! process and entries are never removed. Lookups in both directions go
//! through `DashMap` keyed with `ahash`, so no lock covers the common
//! path.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use ahash::RandomState;
use dashmap::DashMap;

use super::Symbol;

/// Keywords and well-known names interned at construction.
///
/// Order defines the indices of the constants in [`super::kw`]; the two
/// lists must stay in sync.
const PREINTERNED: &[&str] = &[
    "var", "const", "function", "return", "if", "elif", "else", "for", "while", "do", "break",
    "continue", "end", "true", "false", "null", "in", "and", "or", "not", "int", "float", "string",
    "bool", "void", "auto", "main", "range", "print",
];

/// Global string table instance
static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(StringTable::with_preinterned);

/// Access the global table
pub(super) fn table() -> &'static StringTable {
    &STRING_TABLE
}

/// Append-only string table
pub(super) struct StringTable {
    /// Text to index
    map: DashMap<&'static str, u32, RandomState>,
    /// Index to text
    strings: DashMap<u32, &'static str, RandomState>,
    /// Next free index
    next_index: AtomicU32,
}

impl StringTable {
    fn with_preinterned() -> Self {
        let table = Self {
            map: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            strings: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            next_index: AtomicU32::new(0),
        };
        for text in PREINTERNED {
            table.intern(text);
        }
        table
    }

    /// Intern a string, returning the existing symbol if already present
    pub(super) fn intern(&self, text: &str) -> Symbol {
        if let Some(index) = self.map.get(text) {
            return Symbol { index: *index };
        }

        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        match self.map.entry(leaked) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                // Another interning of the same text won the race; the
                // leaked copy is abandoned.
                Symbol {
                    index: *entry.get(),
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let index = self.next_index.fetch_add(1, Ordering::SeqCst);
                entry.insert(index);
                self.strings.insert(index, leaked);
                Symbol { index }
            }
        }
    }

    /// Resolve a symbol back to its text
    ///
    /// A `Symbol` can only be obtained from `intern`, so the reverse
    /// entry always exists.
    pub(super) fn resolve(&self, symbol: Symbol) -> &'static str {
        self.strings
            .get(&symbol.index)
            .map(|entry| *entry)
            .unwrap_or("")
    }

    /// Number of interned strings
    #[cfg(test)]
    fn len(&self) -> usize {
        self.strings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preinterned_indices_are_stable() {
        for (i, text) in PREINTERNED.iter().enumerate() {
            let sym = STRING_TABLE.intern(text);
            assert_eq!(sym.index(), i as u32, "index drift for {:?}", text);
        }
    }

    #[test]
    fn test_table_grows_past_preinterned() {
        let before = STRING_TABLE.len();
        let sym = STRING_TABLE.intern("a_name_no_one_else_interns");
        assert!(sym.index() >= PREINTERNED.len() as u32);
        assert!(STRING_TABLE.len() > before.min(PREINTERNED.len()));
        // Interning again adds nothing
        let len = STRING_TABLE.len();
        STRING_TABLE.intern("a_name_no_one_else_interns");
        assert_eq!(STRING_TABLE.len(), len);
    }

    #[test]
    fn test_resolve_roundtrip() {
        let sym = STRING_TABLE.intern("roundtrip_me");
        assert_eq!(STRING_TABLE.resolve(sym), "roundtrip_me");
    }
}
