//! Scope-stack and identifier-pool properties.
//!
//! Covers the LIFO visibility law (a symbol bound at depth `d` is visible
//! iff the current depth is at least `d` and no closer scope rebinds the
//! identifier) and interning determinism.

mod common;

use cinder_ast::{AddOutcome, AstArena, ScopeStack, SymId, SymKind, Symbol};
use cinder_base::{ident_hash, Ident, IdentPool};
use cinder_sema::SemCtx;
use common::init_logging;

fn fresh_sym(arena: &mut AstArena) -> SymId {
    arena.add_sym(Symbol::new(SymKind::Var, Ident::EMPTY))
}

#[test]
fn interning_determinism() {
    init_logging();
    let spellings = ["x", "openArray", "x", "", "X", "open", "Array", "openArray"];
    let mut a = IdentPool::new();
    let mut b = IdentPool::new();
    let ids_a: Vec<u32> = spellings.iter().map(|s| a.intern(s).id()).collect();
    let ids_b: Vec<u32> = spellings.iter().map(|s| b.intern(s).id()).collect();
    assert_eq!(ids_a, ids_b);
    // Equal ids exactly for equal spellings.
    for (i, si) in spellings.iter().enumerate() {
        for (j, sj) in spellings.iter().enumerate() {
            assert_eq!(ids_a[i] == ids_a[j], si == sj, "{si:?} vs {sj:?}");
        }
    }
}

#[test]
fn stored_hash_matches_the_rolling_hash() {
    let mut pool = IdentPool::new();
    for s in ["inc", "dec", "высота", "a_rather_long_identifier"] {
        let id = pool.intern(s);
        assert_eq!(pool.hash_of(id), ident_hash(s.as_bytes()));
    }
}

#[test]
fn symbol_visibility_follows_scope_depth() {
    init_logging();
    let mut arena = AstArena::new();
    let mut pool = IdentPool::new();
    let mut stack = ScopeStack::new();
    let name = pool.intern("v");
    let outer = fresh_sym(&mut arena);
    let inner = fresh_sym(&mut arena);

    stack.open_scope(); // depth 1
    stack.add(&pool, name, outer).unwrap();
    stack.open_scope(); // depth 2
    stack.open_scope(); // depth 3
    assert_eq!(stack.lookup(&pool, name), Some(outer));

    // A closer binding shadows.
    stack.add(&pool, name, inner).unwrap();
    assert_eq!(stack.lookup(&pool, name), Some(inner));

    // Closing the closer scope restores the outer binding.
    stack.close_scope().unwrap();
    assert_eq!(stack.lookup(&pool, name), Some(outer));

    // Closing past the binding's depth hides it.
    stack.close_scope().unwrap();
    stack.close_scope().unwrap();
    assert_eq!(stack.depth(), 0);
    assert_eq!(stack.lookup(&pool, name), None);
}

#[test]
fn add_unique_detects_same_scope_collisions_only() {
    init_logging();
    let mut arena = AstArena::new();
    let mut pool = IdentPool::new();
    let mut stack = ScopeStack::new();
    let name = pool.intern("dup");
    let first = fresh_sym(&mut arena);
    let second = fresh_sym(&mut arena);
    let third = fresh_sym(&mut arena);

    stack.open_scope();
    assert_eq!(stack.add_unique(&pool, name, first).unwrap(), AddOutcome::Added);
    assert_eq!(
        stack.add_unique(&pool, name, second).unwrap(),
        AddOutcome::Duplicate(first)
    );
    stack.open_scope();
    assert_eq!(stack.add_unique(&pool, name, third).unwrap(), AddOutcome::Added);
}

#[test]
fn overload_enumeration_is_insertion_ordered_per_scope() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let float = ctx.basics.float;
    let first = ctx.declare_proc("f", &[("x", int)], None).unwrap();
    let second = ctx.declare_proc("f", &[("x", float)], None).unwrap();

    // An inner scope contributes its symbols before the outer ones.
    ctx.scopes.open_scope();
    let ident = ctx.intern("f");
    let mut inner = Symbol::new(SymKind::Proc, ident);
    inner.typ = ctx.arena.sym(first).typ;
    let inner = ctx.declare(inner).unwrap();

    let order = ctx.scopes.all_named(&ctx.idents, ident);
    assert_eq!(order, vec![inner, first, second]);
}

#[test]
fn symbols_outlive_their_scope_through_the_arena() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    ctx.scopes.open_scope();
    let ident = ctx.intern("local");
    let mut sym = Symbol::new(SymKind::Var, ident);
    sym.typ = Some(int);
    let id = ctx.declare(sym).unwrap();
    ctx.scopes.close_scope().unwrap();

    // The binding is gone, the symbol itself is not.
    assert_eq!(ctx.scopes.lookup(&ctx.idents, ident), None);
    assert_eq!(ctx.arena.sym(id).ident, ident);
    assert_eq!(ctx.arena.sym(id).typ, Some(int));
}
