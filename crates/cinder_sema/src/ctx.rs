//! The semantic context: everything one compilation unit's analysis needs.
//!
//! [`SemCtx`] owns the arena, the identifier pool, the scope stack, the
//! converter registry, the generic-instance cache and the diagnostics sink.
//! It also provides the declaration builders the typechecker (and the test
//! suites) use to set up signatures: a proc type is a `Proc` descriptor
//! whose `n` is a `FormalParams` node holding one `IdentDefs` per
//! parameter, carrying the parameter symbol and its default-value slot.

use rustc_hash::FxHashMap;

use cinder_ast::types::{Type, TypeFlags};
use cinder_ast::{AstArena, NodeId, NodeKind, ScopeStack, SymId, SymKind, Symbol, TypeId, TypeKind};
use cinder_base::{Ident, IdentPool, SourceLoc};

use crate::diag::Diagnostics;

/// The pre-built primitive types of the unit.
///
/// One descriptor per primitive, created at unit start so every mention of
/// `int` is the same `TypeId`.
pub struct BasicTypes {
    pub bool_t: TypeId,
    pub char_t: TypeId,
    pub int: TypeId,
    pub int8: TypeId,
    pub int16: TypeId,
    pub int32: TypeId,
    pub int64: TypeId,
    pub float: TypeId,
    pub float32: TypeId,
    pub float64: TypeId,
    pub float128: TypeId,
    pub string: TypeId,
    pub cstring: TypeId,
    pub pointer: TypeId,
    pub nil_t: TypeId,
}

impl BasicTypes {
    fn new(arena: &mut AstArena) -> Self {
        BasicTypes {
            bool_t: arena.new_type(TypeKind::Bool),
            char_t: arena.new_type(TypeKind::Char),
            int: arena.new_type(TypeKind::Int),
            int8: arena.new_type(TypeKind::Int8),
            int16: arena.new_type(TypeKind::Int16),
            int32: arena.new_type(TypeKind::Int32),
            int64: arena.new_type(TypeKind::Int64),
            float: arena.new_type(TypeKind::Float),
            float32: arena.new_type(TypeKind::Float32),
            float64: arena.new_type(TypeKind::Float64),
            float128: arena.new_type(TypeKind::Float128),
            string: arena.new_type(TypeKind::String),
            cstring: arena.new_type(TypeKind::CString),
            pointer: arena.new_type(TypeKind::Pointer),
            nil_t: arena.new_type(TypeKind::Nil),
        }
    }
}

/// Per-unit semantic state.
pub struct SemCtx {
    pub arena: AstArena,
    pub idents: IdentPool,
    pub scopes: ScopeStack,
    pub diags: Diagnostics,
    /// Registered user converters, in registration order.
    pub converters: Vec<SymId>,
    pub basics: BasicTypes,
    /// Generic-instance cache: (generic symbol id, normalised bindings) →
    /// instantiated symbol.
    pub(crate) instances: FxHashMap<(u32, Vec<(u32, u32)>), SymId>,
}

impl SemCtx {
    /// A fresh unit: the imported scope and the module's top-level scope
    /// are already open.
    pub fn new() -> Self {
        let mut arena = AstArena::new();
        let basics = BasicTypes::new(&mut arena);
        let mut scopes = ScopeStack::new();
        scopes.open_scope(); // imported symbols
        scopes.open_scope(); // module top level
        SemCtx {
            arena,
            idents: IdentPool::new(),
            scopes,
            diags: Diagnostics::new(),
            converters: Vec::new(),
            basics,
            instances: FxHashMap::default(),
        }
    }

    pub fn intern(&mut self, s: &str) -> Ident {
        self.idents.intern(s)
    }

    /// Creates the symbol and binds it in the topmost scope.
    pub fn declare(&mut self, sym: Symbol) -> cinder_base::Result<SymId> {
        let ident = sym.ident;
        let id = self.arena.add_sym(sym);
        self.scopes.add(&self.idents, ident, id)?;
        Ok(id)
    }

    /// Builds a `Proc` type from named parameters and an optional return.
    pub fn proc_type(&mut self, params: &[(Ident, TypeId)], ret: Option<TypeId>) -> TypeId {
        self.proc_type_flags(params, ret, TypeFlags::empty())
    }

    pub fn proc_type_flags(
        &mut self,
        params: &[(Ident, TypeId)],
        ret: Option<TypeId>,
        flags: TypeFlags,
    ) -> TypeId {
        let mut sons = vec![ret.unwrap_or(TypeId::NIL)];
        let mut defs = vec![NodeId::NIL];
        for (i, &(name, t)) in params.iter().enumerate() {
            let mut sym = Symbol::new(SymKind::Param, name);
            sym.typ = Some(t);
            sym.position = i as i32;
            let sid = self.arena.add_sym(sym);
            let sym_node = self.arena.sym_node(SourceLoc::UNKNOWN, sid);
            let identdefs = self.arena.tree(
                NodeKind::IdentDefs,
                SourceLoc::UNKNOWN,
                vec![sym_node, NodeId::NIL, NodeId::NIL],
            );
            self.arena.sym_mut(sid).def = Some(identdefs);
            defs.push(identdefs);
            sons.push(t);
        }
        let n = self.arena.tree(NodeKind::FormalParams, SourceLoc::UNKNOWN, defs);
        let mut ty = Type::with_sons(TypeKind::Proc, sons);
        ty.n = Some(n);
        ty.flags = flags;
        self.arena.add_type(ty)
    }

    /// Installs a default value on parameter `idx` of a proc type.
    pub fn set_param_default(&mut self, proc_type: TypeId, idx: usize, value: NodeId) {
        let Some(n) = self.arena.typ(proc_type).n else {
            return;
        };
        let Some(&defs) = self.arena.node(n).sons().get(idx + 1) else {
            return;
        };
        if defs.is_nil() {
            return;
        }
        if let Some(sons) = self.arena.node_mut(defs).sons_mut() {
            if let Some(slot) = sons.last_mut() {
                *slot = value;
            }
        }
    }

    /// Declares a proc with the given signature in the topmost scope.
    pub fn declare_proc(
        &mut self,
        name: &str,
        params: &[(&str, TypeId)],
        ret: Option<TypeId>,
    ) -> cinder_base::Result<SymId> {
        self.declare_routine(SymKind::Proc, name, params, ret, TypeFlags::empty())
    }

    pub fn declare_routine(
        &mut self,
        kind: SymKind,
        name: &str,
        params: &[(&str, TypeId)],
        ret: Option<TypeId>,
        flags: TypeFlags,
    ) -> cinder_base::Result<SymId> {
        let mut pairs = Vec::with_capacity(params.len());
        for &(pname, t) in params {
            let ident = self.intern(pname);
            pairs.push((ident, t));
        }
        let t = self.proc_type_flags(&pairs, ret, flags);
        let ident = self.intern(name);
        let mut sym = Symbol::new(kind, ident);
        sym.typ = Some(t);
        self.declare(sym)
    }

    /// Declares and registers a converter from `from` to `to`.
    pub fn declare_converter(
        &mut self,
        name: &str,
        from: TypeId,
        to: TypeId,
    ) -> cinder_base::Result<SymId> {
        let sym =
            self.declare_routine(SymKind::Converter, name, &[("x", from)], Some(to), TypeFlags::empty())?;
        self.converters.push(sym);
        Ok(sym)
    }

    /// A fresh generic parameter type named `name`, unconstrained.
    pub fn generic_param(&mut self, name: &str) -> TypeId {
        self.generic_param_constrained(name, &[])
    }

    /// A fresh generic parameter with the given constraints.
    pub fn generic_param_constrained(&mut self, name: &str, constraints: &[TypeId]) -> TypeId {
        let ident = self.intern(name);
        let sym = self.arena.add_sym(Symbol::new(SymKind::GenericParam, ident));
        let mut ty = Type::with_sons(TypeKind::GenericParam, constraints.to_vec());
        ty.sym = Some(sym);
        let t = self.arena.add_type(ty);
        self.arena.sym_mut(sym).typ = Some(t);
        t
    }

    /// Human-readable rendering of a type, for messages and logs.
    pub fn type_str(&self, t: TypeId) -> String {
        crate::typestr::type_to_string(&self.arena, &self.idents, t)
    }
}

impl Default for SemCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ctx_opens_two_scopes() {
        let ctx = SemCtx::new();
        assert_eq!(ctx.scopes.depth(), 2);
    }

    #[test]
    fn declare_binds_in_top_scope() {
        let mut ctx = SemCtx::new();
        let x = ctx.intern("x");
        let mut sym = Symbol::new(SymKind::Var, x);
        sym.typ = Some(ctx.basics.int);
        let id = ctx.declare(sym).unwrap();
        assert_eq!(ctx.scopes.lookup(&ctx.idents, x), Some(id));
    }

    #[test]
    fn proc_type_layout() {
        let mut ctx = SemCtx::new();
        let x = ctx.intern("x");
        let int = ctx.basics.int;
        let float = ctx.basics.float;
        let t = ctx.proc_type(&[(x, int)], Some(float));
        let ty = ctx.arena.typ(t);
        assert_eq!(ty.kind, TypeKind::Proc);
        assert_eq!(ty.sons, vec![float, int]);
        let n = ty.n.unwrap();
        assert_eq!(ctx.arena.node(n).len(), 2);
        let defs = ctx.arena.node(n).sons()[1];
        let param = ctx.arena.node(defs).sons()[0];
        let sym = ctx.arena.node(param).sym().unwrap();
        assert_eq!(ctx.arena.sym(sym).position, 0);
        assert_eq!(ctx.arena.sym(sym).typ, Some(int));
    }

    #[test]
    fn set_param_default_fills_slot() {
        let mut ctx = SemCtx::new();
        let x = ctx.intern("x");
        let int = ctx.basics.int;
        let t = ctx.proc_type(&[(x, int)], None);
        let dflt = ctx.arena.int_lit(SourceLoc::UNKNOWN, 42, Some(int));
        ctx.set_param_default(t, 0, dflt);
        let n = ctx.arena.typ(t).n.unwrap();
        let defs = ctx.arena.node(n).sons()[1];
        assert_eq!(*ctx.arena.node(defs).sons().last().unwrap(), dflt);
    }

    #[test]
    fn proc_without_return_keeps_nil_slot() {
        let mut ctx = SemCtx::new();
        let t = ctx.proc_type(&[], None);
        assert!(ctx.arena.typ(t).sons[0].is_nil());
    }
}
