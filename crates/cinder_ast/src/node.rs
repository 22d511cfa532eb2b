//! AST nodes: the tree the parser delivers and the typechecker rewrites.
//!
//! A [`Node`] is one variant of the closed [`NodeKind`] enumeration. Every
//! node carries its source location, a flag set, an optional attached
//! comment, an optional type, and exactly one payload: a literal value, an
//! identifier, a symbol reference, or an ordered sequence of children.
//!
//! Children are [`NodeId`]s and may be [`NodeId::NIL`] placeholders. A nil
//! child is significant: it means "absent optional slot" (no return type,
//! no default value, no pragma list), so tree walkers must check
//! [`NodeId::is_nil`] before dereferencing.
//!
//! Nodes live in the [`AstArena`](crate::arena::AstArena) slabs; every node
//! is owned by exactly one parent slot. When a rewrite needs a subtree with
//! fresh identity it goes through [`copy_tree`](crate::arena::AstArena::copy_tree),
//! which copies structure, never shares it.

use bitflags::bitflags;
use cinder_base::Ident;
use cinder_base::SourceLoc;

use crate::sym::SymId;
use crate::types::TypeId;

/// Handle to a node in the arena's node slab.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The nil placeholder: an absent optional slot in a `sons` sequence.
    pub const NIL: NodeId = NodeId(u32::MAX);

    /// Returns `true` for the nil placeholder.
    pub fn is_nil(self) -> bool {
        self == Self::NIL
    }

    /// Returns the raw id.
    pub fn id(self) -> u32 {
        self.0
    }
}

/// The closed enumeration of node kinds.
///
/// The set is stable; every operation over nodes dispatches with one
/// exhaustive `match`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum NodeKind {
    // Atoms
    Empty,
    /// An unresolved identifier (payload: [`Ident`]).
    Ident,
    /// A resolved symbol reference (payload: [`SymId`]).
    Sym,
    CharLit,
    IntLit,
    Int8Lit,
    Int16Lit,
    Int32Lit,
    Int64Lit,
    FloatLit,
    Float32Lit,
    Float64Lit,
    StrLit,
    /// Raw string literal: no escape processing on re-emission.
    RStrLit,
    /// Triple-quoted string literal: may span lines verbatim.
    TripleStrLit,
    NilLit,

    // Operators and call shapes
    /// `f(a, b)`; sons: `[callee, args...]`.
    Call,
    /// `a + b`; sons: `[op, a, b]`.
    Infix,
    /// `-a`; sons: `[op, a]`.
    Prefix,
    /// `a^`; sons: `[op, a]`.
    Postfix,
    /// Named argument `name = value`; sons: `[name, value]`.
    ExprEqExpr,
    /// `a: b` inside constructors; sons: `[field, value]`.
    ExprColonExpr,
    /// `a.b`; sons: `[a, b]`.
    DotExpr,
    /// `a[i]`; sons: `[a, indices...]`.
    BracketExpr,
    /// Array constructor `[a, b, c]`.
    Bracket,
    /// Set constructor `{a, b}`.
    Curly,
    /// Parenthesised expression `(a)`.
    Par,
    /// `a..b`; sons: `[lo, hi]`.
    Range,
    Addr,
    Deref,
    TypeOf,
    Pragma,

    // Statements
    Asgn,
    StmtList,
    IfStmt,
    WhenStmt,
    ElifBranch,
    ElseBranch,
    CaseStmt,
    OfBranch,
    WhileStmt,
    /// `for` loop; sons: `[vars..., iterable, body]`.
    ForStmt,
    TryStmt,
    ExceptBranch,
    Finally,
    BlockStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    DiscardStmt,

    // Declarations
    /// Routine definition; sons: `[name, generic-params, formal-params,
    /// pragmas, body]` with nil placeholders for absent slots.
    ProcDef,
    MethodDef,
    IteratorDef,
    MacroDef,
    TemplateDef,
    ConverterDef,
    /// `const` declarator; sons: `[name, type, value]`.
    ConstDef,
    /// `var`/parameter declarator; sons: `[names..., type, default]`.
    IdentDefs,
    /// Tuple unpacking declarator; sons: `[names..., type, value]`.
    VarTuple,
    /// `type` declarator; sons: `[name, generic-params, body]`.
    TypeDef,
    GenericParams,
    /// Formal parameter list; sons: `[return-type, ident-defs...]`.
    FormalParams,
    EnumFieldDef,

    // Type expressions
    EnumTy,
    ObjectTy,
    RecList,
    RecCase,
    RecWhen,
    OfInherit,
    RefTy,
    PtrTy,
    VarTy,
    DistinctTy,
    TupleTy,
    ProcTy,

    // Sections
    TypeSection,
    ConstSection,
    VarSection,
    ImportStmt,
    FromStmt,
    IncludeStmt,

    // Hidden conversions inserted by the typechecker
    HiddenStdConv,
    HiddenSubConv,
    HiddenCallConv,
    StringToCString,
    CStringToString,
    ObjUpConv,
    ObjDownConv,
    PassAsOpenArray,
    ChckRange,
    ChckRange64,
    ChckRangeF,
}

impl NodeKind {
    /// Conversion nodes the typechecker inserts; recognising them keeps a
    /// second typechecking pass from re-wrapping arguments.
    pub fn is_hidden_conversion(self) -> bool {
        matches!(
            self,
            NodeKind::HiddenStdConv
                | NodeKind::HiddenSubConv
                | NodeKind::HiddenCallConv
                | NodeKind::StringToCString
                | NodeKind::CStringToString
                | NodeKind::ObjUpConv
                | NodeKind::ObjDownConv
                | NodeKind::PassAsOpenArray
                | NodeKind::ChckRange
                | NodeKind::ChckRange64
                | NodeKind::ChckRangeF
        )
    }

    /// Integer literal kinds, of any width.
    pub fn is_int_lit(self) -> bool {
        matches!(
            self,
            NodeKind::IntLit
                | NodeKind::Int8Lit
                | NodeKind::Int16Lit
                | NodeKind::Int32Lit
                | NodeKind::Int64Lit
        )
    }

    /// Float literal kinds, of any width.
    pub fn is_float_lit(self) -> bool {
        matches!(self, NodeKind::FloatLit | NodeKind::Float32Lit | NodeKind::Float64Lit)
    }

    /// String literal kinds (plain, raw, triple-quoted).
    pub fn is_str_lit(self) -> bool {
        matches!(self, NodeKind::StrLit | NodeKind::RStrLit | NodeKind::TripleStrLit)
    }

    /// Routine definition kinds.
    pub fn is_routine_def(self) -> bool {
        matches!(
            self,
            NodeKind::ProcDef
                | NodeKind::MethodDef
                | NodeKind::IteratorDef
                | NodeKind::MacroDef
                | NodeKind::TemplateDef
                | NodeKind::ConverterDef
        )
    }
}

bitflags! {
    /// Per-node flags.
    ///
    /// The base flags record how a numeric literal was spelled so the
    /// renderer can reproduce it.
    #[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
    pub struct NodeFlags: u8 {
        /// Literal was written in binary.
        const BASE2 = 1 << 0;
        /// Literal was written in octal.
        const BASE8 = 1 << 1;
        /// Literal was written in hexadecimal.
        const BASE16 = 1 << 2;
    }
}

/// Payload of a node; exactly one per node, fixed by the kind.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum Payload {
    /// No payload (`Empty` and a few head-only kinds).
    #[default]
    None,
    Int(i64),
    Float(f64),
    Str(String),
    Ident(Ident),
    Sym(SymId),
    Sons(Vec<NodeId>),
}

/// One tree node. See the module docs for the representation rules.
#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: SourceLoc,
    pub flags: NodeFlags,
    /// Type assigned by semantic analysis; `None` until then.
    pub typ: Option<TypeId>,
    /// Comment attached by the parser to this node, if any.
    pub comment: Option<String>,
    pub payload: Payload,
}

impl Node {
    /// Creates a node with an empty payload.
    pub fn new(kind: NodeKind, loc: SourceLoc) -> Self {
        Node {
            kind,
            loc,
            flags: NodeFlags::empty(),
            typ: None,
            comment: None,
            payload: Payload::None,
        }
    }

    /// Creates a node with the given payload.
    pub fn with_payload(kind: NodeKind, loc: SourceLoc, payload: Payload) -> Self {
        Node { payload, ..Node::new(kind, loc) }
    }

    /// The children, or the empty slice for non-tree payloads.
    pub fn sons(&self) -> &[NodeId] {
        match &self.payload {
            Payload::Sons(sons) => sons,
            _ => &[],
        }
    }

    /// Mutable access to the children; `None` for non-tree payloads.
    pub fn sons_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.payload {
            Payload::Sons(sons) => Some(sons),
            _ => None,
        }
    }

    /// Number of children; 0 for non-tree payloads.
    pub fn len(&self) -> usize {
        self.sons().len()
    }

    /// Returns `true` when the node has no children.
    pub fn is_empty(&self) -> bool {
        self.sons().is_empty()
    }

    pub fn int_val(&self) -> Option<i64> {
        match self.payload {
            Payload::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn float_val(&self) -> Option<f64> {
        match self.payload {
            Payload::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn str_val(&self) -> Option<&str> {
        match &self.payload {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn ident(&self) -> Option<Ident> {
        match self.payload {
            Payload::Ident(id) => Some(id),
            _ => None,
        }
    }

    pub fn sym(&self) -> Option<SymId> {
        match self.payload {
            Payload::Sym(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_placeholder_is_recognised() {
        assert!(NodeId::NIL.is_nil());
        assert!(!NodeId(0).is_nil());
    }

    #[test]
    fn hidden_conversions_are_classified() {
        assert!(NodeKind::HiddenStdConv.is_hidden_conversion());
        assert!(NodeKind::StringToCString.is_hidden_conversion());
        assert!(NodeKind::ChckRangeF.is_hidden_conversion());
        assert!(!NodeKind::Call.is_hidden_conversion());
    }

    #[test]
    fn literal_kind_queries() {
        assert!(NodeKind::Int8Lit.is_int_lit());
        assert!(!NodeKind::FloatLit.is_int_lit());
        assert!(NodeKind::Float32Lit.is_float_lit());
        assert!(NodeKind::TripleStrLit.is_str_lit());
    }

    #[test]
    fn sons_of_non_tree_payload_is_empty() {
        let n = Node::with_payload(NodeKind::IntLit, SourceLoc::UNKNOWN, Payload::Int(3));
        assert!(n.sons().is_empty());
        assert_eq!(n.int_val(), Some(3));
        assert_eq!(n.str_val(), None);
    }

    #[test]
    fn base_flags_are_disjoint() {
        let f = NodeFlags::BASE2 | NodeFlags::BASE16;
        assert!(f.contains(NodeFlags::BASE2));
        assert!(!f.contains(NodeFlags::BASE8));
    }
}
