//! Lexical scopes and symbol tables.

use rustc_hash::FxHashMap;
use subc_util::{Span, Symbol};

use crate::hir::LocalId;
use crate::types::DataType;

/// What the analyzer knows about one declared variable
#[derive(Debug, Clone)]
pub struct VarSymbol {
    pub ty: DataType,
    pub is_const: bool,
    /// Storage slot in the enclosing function
    pub local: LocalId,
    pub decl_span: Span,
    /// Element count when the current value is a known array literal;
    /// drives `for x in arr`
    pub array_len: Option<usize>,
}

/// A stack of lexical scopes
///
/// Lookup walks from the innermost scope outward. Shadowing across
/// scopes is allowed; re-declaration within one scope is the caller's
/// error to report (declare returns the previous declaration's span).
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<FxHashMap<Symbol, VarSymbol>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Enter a new innermost scope
    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Leave the innermost scope, dropping its bindings
    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Number of live scopes
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare a name in the innermost scope
    ///
    /// Returns `Err` with the existing declaration's span when the name
    /// is already bound in this scope.
    pub fn declare(&mut self, name: Symbol, symbol: VarSymbol) -> Result<(), Span> {
        let scope = self
            .scopes
            .last_mut()
            .expect("declare called with no open scope");
        if let Some(existing) = scope.get(&name) {
            return Err(existing.decl_span);
        }
        scope.insert(name, symbol);
        Ok(())
    }

    /// Resolve a name, innermost scope first
    pub fn resolve(&self, name: Symbol) -> Option<&VarSymbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    /// Resolve a name for mutation (array length tracking)
    pub fn resolve_mut(&mut self, name: Symbol) -> Option<&mut VarSymbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(&name))
    }
}
