//! The lexical scope stack.
//!
//! A scope is one [`SymTable`]; the stack nests them. By convention depth 0
//! holds imported symbols, depth 1 the current module's top level, and
//! deeper indices nested routines and blocks. `open_scope` grows the stack
//! and `close_scope` pops; closing the outermost scope is a usage error and
//! reported as an [`InternalError`].
//!
//! Popping a scope drops the bindings, not the symbols: anything the AST
//! still references stays alive in the arena.

use cinder_base::{Ident, IdentPool, InternalError};

use crate::sym::SymId;
use crate::tables::SymTable;

/// Outcome of [`ScopeStack::add_unique`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddOutcome {
    Added,
    /// The same identifier was already bound in the topmost scope; carries
    /// the previous symbol.
    Duplicate(SymId),
}

/// The stack of lexical scopes.
#[derive(Default)]
pub struct ScopeStack {
    scopes: Vec<SymTable>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth; 0 means no scope is open.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Pushes an empty scope.
    pub fn open_scope(&mut self) {
        self.scopes.push(SymTable::new());
    }

    /// Pops the topmost scope.
    pub fn close_scope(&mut self) -> cinder_base::Result<()> {
        if self.scopes.pop().is_none() {
            return Err(InternalError::new("close_scope with no open scope"));
        }
        Ok(())
    }

    /// Inserts `sym` under `ident` into the topmost scope. Duplicates are
    /// the caller's responsibility; use [`ScopeStack::add_unique`] to detect
    /// them.
    pub fn add(&mut self, pool: &IdentPool, ident: Ident, sym: SymId) -> cinder_base::Result<()> {
        let hash = pool.hash_of(ident);
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(hash, ident, sym);
                Ok(())
            }
            None => Err(InternalError::new("add to scope stack with no open scope")),
        }
    }

    /// Like [`ScopeStack::add`], but reports an existing binding of the
    /// same identifier in the topmost scope instead of shadowing it.
    pub fn add_unique(
        &mut self,
        pool: &IdentPool,
        ident: Ident,
        sym: SymId,
    ) -> cinder_base::Result<AddOutcome> {
        let hash = pool.hash_of(ident);
        match self.scopes.last_mut() {
            Some(scope) => {
                if let Some(prev) = scope.get(hash, ident) {
                    return Ok(AddOutcome::Duplicate(prev));
                }
                scope.insert(hash, ident, sym);
                Ok(AddOutcome::Added)
            }
            None => Err(InternalError::new("add_unique to scope stack with no open scope")),
        }
    }

    /// Searches the topmost scope only.
    pub fn lookup_local(&self, pool: &IdentPool, ident: Ident) -> Option<SymId> {
        let hash = pool.hash_of(ident);
        self.scopes.last().and_then(|scope| scope.get(hash, ident))
    }

    /// Searches from the topmost scope to the bottom; first hit wins.
    pub fn lookup(&self, pool: &IdentPool, ident: Ident) -> Option<SymId> {
        let hash = pool.hash_of(ident);
        self.scopes.iter().rev().find_map(|scope| scope.get(hash, ident))
    }

    /// Every symbol bound under `ident`, innermost scope first, insertion
    /// order within each scope. This is the enumeration order of overload
    /// candidates, so it must stay deterministic.
    pub fn all_named(&self, pool: &IdentPool, ident: Ident) -> Vec<SymId> {
        let mut out = Vec::new();
        for scope in self.scopes.iter().rev() {
            out.extend(scope.entries_named(ident));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym::SymId;

    fn sym(n: u32) -> SymId {
        SymId(n)
    }

    #[test]
    fn open_and_close_track_depth() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.depth(), 0);
        stack.open_scope();
        stack.open_scope();
        assert_eq!(stack.depth(), 2);
        stack.close_scope().unwrap();
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn closing_outermost_scope_is_an_error() {
        let mut stack = ScopeStack::new();
        assert!(stack.close_scope().is_err());
    }

    #[test]
    fn lookup_finds_outer_bindings() {
        let mut pool = IdentPool::new();
        let mut stack = ScopeStack::new();
        let x = pool.intern("x");
        stack.open_scope();
        stack.add(&pool, x, sym(1)).unwrap();
        stack.open_scope();
        assert_eq!(stack.lookup(&pool, x), Some(sym(1)));
        assert_eq!(stack.lookup_local(&pool, x), None);
    }

    #[test]
    fn inner_binding_shadows_outer() {
        let mut pool = IdentPool::new();
        let mut stack = ScopeStack::new();
        let x = pool.intern("x");
        stack.open_scope();
        stack.add(&pool, x, sym(1)).unwrap();
        stack.open_scope();
        stack.add(&pool, x, sym(2)).unwrap();
        assert_eq!(stack.lookup(&pool, x), Some(sym(2)));
        stack.close_scope().unwrap();
        assert_eq!(stack.lookup(&pool, x), Some(sym(1)));
    }

    #[test]
    fn close_drops_bindings() {
        let mut pool = IdentPool::new();
        let mut stack = ScopeStack::new();
        let x = pool.intern("x");
        stack.open_scope();
        stack.open_scope();
        stack.add(&pool, x, sym(1)).unwrap();
        stack.close_scope().unwrap();
        assert_eq!(stack.lookup(&pool, x), None);
    }

    #[test]
    fn add_unique_reports_duplicate_in_same_scope_only() {
        let mut pool = IdentPool::new();
        let mut stack = ScopeStack::new();
        let x = pool.intern("x");
        stack.open_scope();
        assert_eq!(stack.add_unique(&pool, x, sym(1)).unwrap(), AddOutcome::Added);
        assert_eq!(
            stack.add_unique(&pool, x, sym(2)).unwrap(),
            AddOutcome::Duplicate(sym(1))
        );
        stack.open_scope();
        // Shadowing an outer scope is fine.
        assert_eq!(stack.add_unique(&pool, x, sym(3)).unwrap(), AddOutcome::Added);
    }

    #[test]
    fn all_named_is_innermost_first_insertion_order() {
        let mut pool = IdentPool::new();
        let mut stack = ScopeStack::new();
        let f = pool.intern("f");
        stack.open_scope();
        stack.add(&pool, f, sym(1)).unwrap();
        stack.add(&pool, f, sym(2)).unwrap();
        stack.open_scope();
        stack.add(&pool, f, sym(3)).unwrap();
        assert_eq!(stack.all_named(&pool, f), vec![sym(3), sym(1), sym(2)]);
    }

    #[test]
    fn add_with_no_scope_is_an_error() {
        let mut pool = IdentPool::new();
        let mut stack = ScopeStack::new();
        let x = pool.intern("x");
        assert!(stack.add(&pool, x, sym(1)).is_err());
    }
}
