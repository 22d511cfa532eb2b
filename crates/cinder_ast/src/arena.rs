//! The per-compilation-unit store for nodes, symbols and types.
//!
//! Symbols point at their types, types point back at declaring symbols, and
//! generic instances hold their templates: the cross-reference graph is
//! cyclic. [`AstArena`] makes that representable by keeping all three kinds
//! in typed slabs and using plain ids for every cross-reference. Id
//! counters start at unit start and are never reset, so every node, symbol
//! and type keeps a unique id for the unit's whole lifetime.
//!
//! Nothing is ever freed during semantic analysis; the arena only grows.

use cinder_base::{Ident, SourceLoc};

use crate::node::{Node, NodeId, NodeKind, Payload};
use crate::sym::{SymId, Symbol};
use crate::types::{Type, TypeId, TypeKind};

/// The three typed slabs of a compilation unit.
#[derive(Default)]
pub struct AstArena {
    nodes: Vec<Node>,
    syms: Vec<Symbol>,
    types: Vec<Type>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Slab access
    // ------------------------------------------------------------------

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// # Panics
    ///
    /// Panics on [`NodeId::NIL`] or a foreign id; both are compiler bugs.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn add_sym(&mut self, sym: Symbol) -> SymId {
        let id = SymId(self.syms.len() as u32);
        self.syms.push(sym);
        id
    }

    pub fn sym(&self, id: SymId) -> &Symbol {
        &self.syms[id.0 as usize]
    }

    pub fn sym_mut(&mut self, id: SymId) -> &mut Symbol {
        &mut self.syms[id.0 as usize]
    }

    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn typ(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn typ_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn sym_count(&self) -> usize {
        self.syms.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ------------------------------------------------------------------
    // Node builders
    // ------------------------------------------------------------------

    /// A childless node with an empty payload.
    pub fn node_at(&mut self, kind: NodeKind, loc: SourceLoc) -> NodeId {
        self.add_node(Node::new(kind, loc))
    }

    /// A tree node with the given children.
    pub fn tree(&mut self, kind: NodeKind, loc: SourceLoc, sons: Vec<NodeId>) -> NodeId {
        self.add_node(Node::with_payload(kind, loc, Payload::Sons(sons)))
    }

    pub fn int_lit(&mut self, loc: SourceLoc, value: i64, typ: Option<TypeId>) -> NodeId {
        self.int_lit_kind(NodeKind::IntLit, loc, value, typ)
    }

    pub fn int_lit_kind(
        &mut self,
        kind: NodeKind,
        loc: SourceLoc,
        value: i64,
        typ: Option<TypeId>,
    ) -> NodeId {
        let mut node = Node::with_payload(kind, loc, Payload::Int(value));
        node.typ = typ;
        self.add_node(node)
    }

    pub fn float_lit(&mut self, loc: SourceLoc, value: f64, typ: Option<TypeId>) -> NodeId {
        self.float_lit_kind(NodeKind::FloatLit, loc, value, typ)
    }

    pub fn float_lit_kind(
        &mut self,
        kind: NodeKind,
        loc: SourceLoc,
        value: f64,
        typ: Option<TypeId>,
    ) -> NodeId {
        let mut node = Node::with_payload(kind, loc, Payload::Float(value));
        node.typ = typ;
        self.add_node(node)
    }

    pub fn str_lit(&mut self, loc: SourceLoc, value: &str, typ: Option<TypeId>) -> NodeId {
        let mut node = Node::with_payload(NodeKind::StrLit, loc, Payload::Str(value.to_string()));
        node.typ = typ;
        self.add_node(node)
    }

    pub fn ident_node(&mut self, loc: SourceLoc, ident: Ident) -> NodeId {
        self.add_node(Node::with_payload(NodeKind::Ident, loc, Payload::Ident(ident)))
    }

    /// A symbol reference node; the node's type is the symbol's type.
    pub fn sym_node(&mut self, loc: SourceLoc, sym: SymId) -> NodeId {
        let typ = self.sym(sym).typ;
        let mut node = Node::with_payload(NodeKind::Sym, loc, Payload::Sym(sym));
        node.typ = typ;
        self.add_node(node)
    }

    /// Wraps `inner` in a single-child conversion node of the given kind
    /// and type.
    pub fn conv_node(
        &mut self,
        kind: NodeKind,
        loc: SourceLoc,
        inner: NodeId,
        typ: TypeId,
    ) -> NodeId {
        let mut node = Node::with_payload(kind, loc, Payload::Sons(vec![inner]));
        node.typ = Some(typ);
        self.add_node(node)
    }

    // ------------------------------------------------------------------
    // Type builders
    // ------------------------------------------------------------------

    pub fn new_type(&mut self, kind: TypeKind) -> TypeId {
        self.add_type(Type::new(kind))
    }

    pub fn new_type_with(&mut self, kind: TypeKind, sons: Vec<TypeId>) -> TypeId {
        self.add_type(Type::with_sons(kind, sons))
    }

    // ------------------------------------------------------------------
    // Tree operations
    // ------------------------------------------------------------------

    /// Deep-copies a subtree into fresh ids. Copies are by structure, not
    /// reference: the result shares no node with the original. Nil
    /// placeholders stay nil.
    pub fn copy_tree(&mut self, n: NodeId) -> NodeId {
        if n.is_nil() {
            return NodeId::NIL;
        }
        let mut template = self.node(n).clone();
        if let Payload::Sons(sons) = &template.payload {
            let sons = sons.clone();
            let copied = sons.iter().map(|&son| self.copy_tree(son)).collect();
            template.payload = Payload::Sons(copied);
        }
        self.add_node(template)
    }

    /// Structural tree equality: same kinds, same literal payloads, same
    /// identifiers and symbols, equivalent children. Locations, comments
    /// and flags are ignored.
    pub fn expr_structural_equivalent(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return true;
        }
        if a.is_nil() || b.is_nil() {
            return false;
        }
        let (na, nb) = (self.node(a), self.node(b));
        if na.kind != nb.kind {
            return false;
        }
        match (&na.payload, &nb.payload) {
            (Payload::Sons(sa), Payload::Sons(sb)) => {
                sa.len() == sb.len()
                    && sa
                        .iter()
                        .zip(sb.iter())
                        .all(|(&x, &y)| {
                            if x.is_nil() || y.is_nil() {
                                x.is_nil() && y.is_nil()
                            } else {
                                self.expr_structural_equivalent(x, y)
                            }
                        })
            }
            (pa, pb) => pa == pb,
        }
    }
}
