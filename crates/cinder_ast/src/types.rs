//! Type descriptors and the structural queries over them.
//!
//! A [`Type`] is a tagged structural descriptor in the arena's type slab.
//! Cross-references are [`TypeId`]s; like node children, a son slot may be
//! [`TypeId::NIL`] (a proc type with no return type keeps a nil slot at
//! position 0 so positions stay fixed).
//!
//! ## Son layout per kind
//!
//! | Kind | `sons` | `n` |
//! |------|--------|-----|
//! | `Array`, `ArrayConstr` | `[index, elem]` | |
//! | `OpenArray`, `Sequence`, `Set`, `Ref`, `Ptr`, `Var`, `Distinct` | `[elem]` | |
//! | `Range` | `[base]` | `Range` node `[lo, hi]` |
//! | `Proc` | `[return-or-nil, params...]` | `FormalParams` node |
//! | `Object` | `[base-or-nil]` | `RecList` of field `Sym`s |
//! | `Record`, `RecordConstr` | field types | `RecList` of field `Sym`s |
//! | `Tuple` | element types | |
//! | `Enum` | | `EnumTy` node of field `Sym`s |
//! | `GenericParam` | constraints | |
//! | `Generic` | formal generic params | |
//! | `GenericInst` | `[args..., body]` | |
//!
//! Equality follows the language rules: nominal kinds compare by id,
//! structural kinds by recursive equivalence ([`same_type`]).

use bitflags::bitflags;

use crate::arena::AstArena;
use crate::node::NodeId;
use crate::sym::SymId;

/// Handle to a type in the arena's type slab; nominal identity of the type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// The nil placeholder for absent son slots (e.g. a missing return type).
    pub const NIL: TypeId = TypeId(u32::MAX);

    pub fn is_nil(self) -> bool {
        self == Self::NIL
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// The closed enumeration of type kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TypeKind {
    // Primitives
    Bool,
    Char,
    /// A declared enumeration; nominal.
    Enum,
    /// Constraint kind matching any enumeration.
    AnyEnum,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Float32,
    Float64,
    Float128,
    String,
    CString,
    Pointer,
    /// The type of the `nil` literal.
    Nil,

    // Compounds
    Array,
    /// The type of a `[a, b, c]` constructor before it is fitted to a slot.
    ArrayConstr,
    OpenArray,
    Sequence,
    Set,
    /// The type of an empty `{}` constructor.
    EmptySet,
    Tuple,
    /// Structural record type.
    Record,
    /// The type of a record constructor expression.
    RecordConstr,
    /// Nominal object type with single inheritance.
    Object,
    Ref,
    Ptr,
    Var,
    Distinct,

    // Callables
    Proc,

    // Generics
    /// A declared generic type; instances share its `container_id`.
    Generic,
    /// A placeholder inside a generic signature.
    GenericParam,
    /// A concrete instantiation of a generic.
    GenericInst,

    // Bookkeeping
    Range,
    Forward,
}

impl TypeKind {
    /// The signed integer family, platform `Int` included.
    pub fn is_int_family(self) -> bool {
        matches!(
            self,
            TypeKind::Int | TypeKind::Int8 | TypeKind::Int16 | TypeKind::Int32 | TypeKind::Int64
        )
    }

    /// The float family.
    pub fn is_float_family(self) -> bool {
        matches!(
            self,
            TypeKind::Float | TypeKind::Float32 | TypeKind::Float64 | TypeKind::Float128
        )
    }

    /// Width in bits for the fixed-width integer kinds; platform `Int` is
    /// reported as 64 but is *not* interchangeable with `Int64` in the
    /// compatibility relation.
    pub fn int_width(self) -> Option<u32> {
        match self {
            TypeKind::Int8 => Some(8),
            TypeKind::Int16 => Some(16),
            TypeKind::Int32 => Some(32),
            TypeKind::Int | TypeKind::Int64 => Some(64),
            _ => None,
        }
    }

    /// Nominal kinds compare by id, never structurally.
    pub fn is_nominal(self) -> bool {
        matches!(
            self,
            TypeKind::Enum
                | TypeKind::Object
                | TypeKind::Distinct
                | TypeKind::Generic
                | TypeKind::GenericParam
                | TypeKind::Forward
        )
    }

    /// Byte size of the primitive kinds; `None` for aggregates whose size
    /// the front-end computes and caches on the descriptor.
    pub fn primitive_size(self) -> Option<i64> {
        match self {
            TypeKind::Bool | TypeKind::Char | TypeKind::Int8 => Some(1),
            TypeKind::Int16 => Some(2),
            TypeKind::Int32 | TypeKind::Float32 => Some(4),
            TypeKind::Int | TypeKind::Int64 | TypeKind::Float | TypeKind::Float64 => Some(8),
            TypeKind::Float128 => Some(16),
            TypeKind::Pointer | TypeKind::CString | TypeKind::String | TypeKind::Ref
            | TypeKind::Ptr | TypeKind::Proc | TypeKind::Nil => Some(8),
            _ => None,
        }
    }
}

/// Calling convention of a `Proc` type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CallConv {
    #[default]
    Default,
    CDecl,
    StdCall,
    SafeCall,
    SysCall,
    Inline,
    NoInline,
    FastCall,
    Closure,
    NoConv,
}

bitflags! {
    /// Boolean properties of a type.
    #[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
    pub struct TypeFlags: u8 {
        /// Proc accepts a variadic tail after its last formal.
        const VARARGS = 1 << 0;
        /// Object cannot be inherited from.
        const FINAL = 1 << 1;
    }
}

/// A type descriptor. See the module docs for the son layout per kind.
#[derive(Clone, Debug)]
pub struct Type {
    pub kind: TypeKind,
    pub sons: Vec<TypeId>,
    /// Associated AST node: field list, parameter list or range literal.
    pub n: Option<NodeId>,
    /// Declaring symbol, when the type was introduced by a declaration.
    pub sym: Option<SymId>,
    pub flags: TypeFlags,
    /// For a `GenericInst`, the declared `Generic` it instantiates; for a
    /// declared `Generic`, its own id.
    pub container_id: Option<TypeId>,
    pub callconv: CallConv,
    /// Cached byte size; -1 until computed.
    pub size: i64,
    /// Cached alignment; -1 until computed.
    pub align: i16,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type {
            kind,
            sons: Vec::new(),
            n: None,
            sym: None,
            flags: TypeFlags::empty(),
            container_id: None,
            callconv: CallConv::Default,
            size: -1,
            align: -1,
        }
    }

    pub fn with_sons(kind: TypeKind, sons: Vec<TypeId>) -> Self {
        Type { sons, ..Type::new(kind) }
    }

    /// Last son; the body slot of a `GenericInst`.
    pub fn last_son(&self) -> Option<TypeId> {
        self.sons.last().copied()
    }
}

/// Descends through `Var` wrappers.
pub fn skip_var(arena: &AstArena, t: TypeId) -> TypeId {
    let mut t = t;
    while arena.typ(t).kind == TypeKind::Var {
        match arena.typ(t).sons.first() {
            Some(&inner) if !inner.is_nil() => t = inner,
            _ => break,
        }
    }
    t
}

/// Unfolds a `GenericInst` to its instantiated body.
pub fn skip_inst(arena: &AstArena, t: TypeId) -> TypeId {
    let mut t = t;
    while arena.typ(t).kind == TypeKind::GenericInst {
        match arena.typ(t).last_son() {
            Some(body) if !body.is_nil() => t = body,
            _ => break,
        }
    }
    t
}

/// Element type of the container kinds; `None` elsewhere.
pub fn elem_type(arena: &AstArena, t: TypeId) -> Option<TypeId> {
    let ty = arena.typ(t);
    let son = match ty.kind {
        TypeKind::Array | TypeKind::ArrayConstr => ty.sons.get(1),
        TypeKind::OpenArray
        | TypeKind::Sequence
        | TypeKind::Set
        | TypeKind::Ref
        | TypeKind::Ptr
        | TypeKind::Var
        | TypeKind::Distinct
        | TypeKind::Range => ty.sons.first(),
        _ => None,
    };
    son.copied().filter(|s| !s.is_nil())
}

/// The base an `Object` inherits from, or the base type of a `Range`.
pub fn base_of(arena: &AstArena, t: TypeId) -> Option<TypeId> {
    let ty = arena.typ(t);
    match ty.kind {
        TypeKind::Object | TypeKind::Range => ty.sons.first().copied().filter(|s| !s.is_nil()),
        _ => None,
    }
}

/// Whether `sub` reaches `sup` through `Object` base links.
pub fn inherits_from(arena: &AstArena, sub: TypeId, sup: TypeId) -> bool {
    let mut cur = base_of(arena, sub);
    while let Some(t) = cur {
        if t == sup {
            return true;
        }
        cur = base_of(arena, t);
    }
    false
}

/// Ordinal types: the kinds `case` statements and array indexes accept.
pub fn is_ordinal(arena: &AstArena, t: TypeId) -> bool {
    let ty = arena.typ(t);
    match ty.kind {
        TypeKind::Bool | TypeKind::Char | TypeKind::Enum => true,
        k if k.is_int_family() => true,
        TypeKind::Range => base_of(arena, t).is_some_and(|b| is_ordinal(arena, b)),
        TypeKind::Distinct => elem_type(arena, t).is_some_and(|b| is_ordinal(arena, b)),
        _ => false,
    }
}

/// Smallest value of an ordinal type, as an `i64`.
pub fn first_ord(arena: &AstArena, t: TypeId) -> i64 {
    let ty = arena.typ(t);
    match ty.kind {
        TypeKind::Bool | TypeKind::Char | TypeKind::Enum => 0,
        TypeKind::Int8 => i64::from(i8::MIN),
        TypeKind::Int16 => i64::from(i16::MIN),
        TypeKind::Int32 => i64::from(i32::MIN),
        TypeKind::Int | TypeKind::Int64 => i64::MIN,
        TypeKind::Range => range_bound(arena, t, 0),
        _ => 0,
    }
}

/// Largest value of an ordinal type, as an `i64`.
pub fn last_ord(arena: &AstArena, t: TypeId) -> i64 {
    let ty = arena.typ(t);
    match ty.kind {
        TypeKind::Bool => 1,
        TypeKind::Char => 255,
        TypeKind::Enum => match ty.n {
            Some(n) => arena.node(n).len() as i64 - 1,
            None => 0,
        },
        TypeKind::Int8 => i64::from(i8::MAX),
        TypeKind::Int16 => i64::from(i16::MAX),
        TypeKind::Int32 => i64::from(i32::MAX),
        TypeKind::Int | TypeKind::Int64 => i64::MAX,
        TypeKind::Range => range_bound(arena, t, 1),
        _ => 0,
    }
}

fn range_bound(arena: &AstArena, t: TypeId, idx: usize) -> i64 {
    arena
        .typ(t)
        .n
        .and_then(|n| arena.node(n).sons().get(idx).copied())
        .filter(|b| !b.is_nil())
        .and_then(|b| arena.node(b).int_val())
        .unwrap_or(0)
}

/// Number of elements of an `Array` or `ArrayConstr`, from its index type.
pub fn array_len(arena: &AstArena, t: TypeId) -> Option<i64> {
    let ty = arena.typ(t);
    match ty.kind {
        TypeKind::Array | TypeKind::ArrayConstr => {
            let index = *ty.sons.first()?;
            if index.is_nil() {
                return None;
            }
            Some(last_ord(arena, index) - first_ord(arena, index) + 1)
        }
        _ => None,
    }
}

/// Byte size of a type; -1 when not computable here. Ranges and distincts
/// take the size of their base.
pub fn type_size(arena: &AstArena, t: TypeId) -> i64 {
    let ty = arena.typ(t);
    if ty.size >= 0 {
        return ty.size;
    }
    match ty.kind {
        k if k.primitive_size().is_some() => k.primitive_size().unwrap_or(-1),
        TypeKind::Enum => 4,
        TypeKind::Range | TypeKind::Distinct => match elem_type(arena, t) {
            Some(base) => type_size(arena, base),
            None => -1,
        },
        _ => -1,
    }
}

/// Type equality: nominal kinds by id, structural kinds by recursive
/// equivalence. Nil son slots only match nil son slots.
pub fn same_type(arena: &AstArena, a: TypeId, b: TypeId) -> bool {
    if a == b {
        return true;
    }
    if a.is_nil() || b.is_nil() {
        return false;
    }
    let (ta, tb) = (arena.typ(a), arena.typ(b));
    if ta.kind != tb.kind {
        return false;
    }
    if ta.kind.is_nominal() {
        // Ids differ, checked above.
        return false;
    }
    match ta.kind {
        TypeKind::Range => {
            same_sons(arena, a, b)
                && range_bound(arena, a, 0) == range_bound(arena, b, 0)
                && range_bound(arena, a, 1) == range_bound(arena, b, 1)
        }
        TypeKind::Proc => {
            ta.callconv == tb.callconv
                && ta.flags.contains(TypeFlags::VARARGS) == tb.flags.contains(TypeFlags::VARARGS)
                && same_sons(arena, a, b)
        }
        TypeKind::Record | TypeKind::RecordConstr => {
            same_sons(arena, a, b) && same_field_names(arena, a, b)
        }
        _ => same_sons(arena, a, b),
    }
}

fn same_sons(arena: &AstArena, a: TypeId, b: TypeId) -> bool {
    let (sa, sb) = (&arena.typ(a).sons, &arena.typ(b).sons);
    if sa.len() != sb.len() {
        return false;
    }
    // Clone the id lists so the recursion does not hold a borrow.
    let (sa, sb) = (sa.clone(), sb.clone());
    sa.iter().zip(sb.iter()).all(|(&x, &y)| {
        if x.is_nil() || y.is_nil() {
            x.is_nil() && y.is_nil()
        } else {
            same_type(arena, x, y)
        }
    })
}

fn same_field_names(arena: &AstArena, a: TypeId, b: TypeId) -> bool {
    let names = |t: TypeId| -> Option<Vec<cinder_base::Ident>> {
        let n = arena.typ(t).n?;
        let mut out = Vec::new();
        for &field in arena.node(n).sons() {
            if field.is_nil() {
                continue;
            }
            let sym = arena.node(field).sym()?;
            out.push(arena.sym(sym).ident);
        }
        Some(out)
    };
    match (names(a), names(b)) {
        (Some(na), Some(nb)) => na == nb,
        (None, None) => true,
        _ => false,
    }
}
