//! The ranked type-compatibility relation.
//!
//! [`type_rel`] answers "how well does an actual type fit a formal type"
//! with one of five ranks, ordered from worst to best:
//!
//! ```text
//! None < Convertible < Subtype < Generic < Equal
//! ```
//!
//! The relation is total over every [`TypeKind`] pair and terminates on the
//! cyclic type graphs: structural descent only follows the finite skeleton,
//! and the nominal kinds short-circuit on id equality.
//!
//! It is pure with respect to the types themselves but effectful on the
//! generic [`Bindings`]: a successful unification of an unbound generic
//! parameter inserts a binding. Callers keep one bindings table per
//! overload candidate, so a failed candidate never leaks partial bindings
//! into another candidate's view.

use cinder_ast::tables::IdTable;
use cinder_ast::types::{
    array_len, base_of, elem_type, first_ord, inherits_from, same_type, skip_inst, skip_var, Type,
};
use cinder_ast::{AstArena, TypeId, TypeKind};

/// Match quality, ordered worst to best.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Rank {
    None,
    Convertible,
    Subtype,
    Generic,
    Equal,
}

impl Rank {
    /// The weaker of two ranks.
    pub fn weaker(self, other: Rank) -> Rank {
        self.min(other)
    }
}

/// Generic-parameter bindings: generic-param type id → bound concrete type.
pub type Bindings = IdTable<TypeId>;

/// Computes the rank of `actual` against `formal`, inserting generic
/// bindings into `map` on success.
pub fn type_rel(arena: &mut AstArena, map: &mut Bindings, formal: TypeId, actual: TypeId) -> Rank {
    // Presence/absence of a type (a proc's return slot) must agree.
    if formal.is_nil() || actual.is_nil() {
        return if formal == actual { Rank::Equal } else { Rank::None };
    }
    if formal == actual {
        return Rank::Equal;
    }

    let fk = arena.typ(formal).kind;
    if fk == TypeKind::GenericInst {
        let body = skip_inst(arena, formal);
        return type_rel(arena, map, body, actual);
    }

    let ak = arena.typ(actual).kind;
    if ak == TypeKind::GenericInst && fk != TypeKind::Generic {
        let body = skip_inst(arena, actual);
        return type_rel(arena, map, formal, body);
    }
    if ak == TypeKind::Var && fk != TypeKind::Var {
        let inner = skip_var(arena, actual);
        return type_rel(arena, map, formal, inner);
    }
    if ak == TypeKind::GenericParam && fk != TypeKind::GenericParam {
        // A bound generic actual behaves as what it is bound to.
        match map.get(actual.id()).copied() {
            Some(bound) => return type_rel(arena, map, formal, bound),
            None => return Rank::None,
        }
    }

    match fk {
        TypeKind::Bool | TypeKind::Char => ordinal_rel(arena, fk, actual, ak),
        TypeKind::Enum => {
            if ak == TypeKind::Range && base_of(arena, actual) == Some(formal) {
                Rank::Subtype
            } else {
                Rank::None
            }
        }
        TypeKind::AnyEnum => match ak {
            TypeKind::AnyEnum => Rank::Equal,
            TypeKind::Enum => Rank::Subtype,
            TypeKind::Range => match base_of(arena, actual) {
                Some(base) if arena.typ(base).kind == TypeKind::Enum => Rank::Subtype,
                _ => Rank::None,
            },
            _ => Rank::None,
        },
        TypeKind::Int | TypeKind::Int8 | TypeKind::Int16 | TypeKind::Int32 | TypeKind::Int64 => {
            int_rel(arena, map, formal, fk, actual, ak)
        }
        TypeKind::Float | TypeKind::Float32 | TypeKind::Float64 | TypeKind::Float128 => {
            float_rel(arena, map, formal, fk, actual, ak)
        }
        TypeKind::Range => {
            if ak == TypeKind::Range {
                let (fb, ab) = (range_base(arena, formal), range_base(arena, actual));
                if same_type(arena, fb, ab) {
                    if first_ord(arena, formal) == first_ord(arena, actual)
                        && cinder_ast::types::last_ord(arena, formal)
                            == cinder_ast::types::last_ord(arena, actual)
                    {
                        Rank::Equal
                    } else {
                        Rank::Subtype
                    }
                } else {
                    Rank::None
                }
            } else {
                // Fitting a plain value into a range needs a checked
                // conversion.
                let base = range_base(arena, formal);
                if type_rel(arena, map, base, actual) >= Rank::Convertible {
                    Rank::Convertible
                } else {
                    Rank::None
                }
            }
        }
        TypeKind::Array => array_rel(arena, map, formal, actual, ak),
        TypeKind::ArrayConstr => {
            // Array constructors only appear as actuals; as a formal the
            // relation degenerates to element equivalence.
            if ak == TypeKind::ArrayConstr {
                let (fe, ae) = (elem_or_nil(arena, formal), elem_or_nil(arena, actual));
                if type_rel(arena, map, fe, ae) == Rank::Equal {
                    Rank::Equal
                } else {
                    Rank::None
                }
            } else {
                Rank::None
            }
        }
        TypeKind::OpenArray => open_array_rel(arena, map, formal, actual, ak),
        TypeKind::Sequence => seq_rel(arena, map, formal, actual, ak),
        TypeKind::Set => match ak {
            TypeKind::Set => {
                let (fe, ae) = (elem_or_nil(arena, formal), elem_or_nil(arena, actual));
                if type_rel(arena, map, fe, ae) >= Rank::Convertible {
                    Rank::Equal
                } else {
                    Rank::None
                }
            }
            TypeKind::EmptySet => Rank::Subtype,
            _ => Rank::None,
        },
        TypeKind::EmptySet => {
            if ak == TypeKind::EmptySet {
                Rank::Equal
            } else {
                Rank::None
            }
        }
        TypeKind::Tuple => tuple_rel(arena, map, formal, actual, ak),
        TypeKind::Record | TypeKind::RecordConstr => record_rel(arena, map, formal, actual, ak),
        TypeKind::Object => {
            if ak == TypeKind::Object && inherits_from(arena, actual, formal) {
                Rank::Subtype
            } else {
                Rank::None
            }
        }
        TypeKind::Distinct => Rank::None, // nominal; id equality was checked above
        TypeKind::Ref | TypeKind::Ptr => ptr_rel(arena, map, formal, fk, actual, ak),
        TypeKind::Var => {
            let inner = elem_or_nil(arena, formal);
            if ak == TypeKind::Var {
                let a_inner = elem_or_nil(arena, actual);
                type_rel(arena, map, inner, a_inner)
            } else {
                // L-valueness is the matcher's concern, not the relation's.
                type_rel(arena, map, inner, actual)
            }
        }
        TypeKind::Pointer => match ak {
            TypeKind::Pointer => Rank::Equal,
            TypeKind::Nil => Rank::Subtype,
            TypeKind::Ref | TypeKind::Ptr | TypeKind::CString => Rank::Convertible,
            TypeKind::Proc => {
                if arena.typ(actual).callconv != cinder_ast::CallConv::Closure {
                    Rank::Convertible
                } else {
                    Rank::None
                }
            }
            _ => Rank::None,
        },
        TypeKind::CString => match ak {
            TypeKind::CString => Rank::Equal,
            TypeKind::Nil => Rank::Subtype,
            TypeKind::String => Rank::Convertible,
            TypeKind::Array if is_zero_based_char_array(arena, actual) => Rank::Convertible,
            _ => Rank::None,
        },
        TypeKind::String => match ak {
            TypeKind::String => Rank::Equal,
            TypeKind::Nil => Rank::Subtype,
            TypeKind::CString => Rank::Convertible,
            _ => Rank::None,
        },
        TypeKind::Nil => {
            if ak == TypeKind::Nil {
                Rank::Equal
            } else {
                Rank::None
            }
        }
        TypeKind::Proc => proc_rel(arena, map, formal, actual, ak),
        TypeKind::GenericParam => generic_param_rel(arena, map, formal, actual),
        TypeKind::Generic => generic_rel(arena, map, formal, actual, ak),
        TypeKind::GenericInst => Rank::None, // unfolded above
        TypeKind::Forward => Rank::None,     // nominal; id equality was checked above
    }
}

fn ordinal_rel(arena: &AstArena, fk: TypeKind, actual: TypeId, ak: TypeKind) -> Rank {
    if ak == fk {
        Rank::Equal
    } else if ak == TypeKind::Range
        && base_of(arena, actual).map(|b| arena.typ(b).kind) == Some(fk)
    {
        Rank::Subtype
    } else {
        Rank::None
    }
}

fn int_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    fk: TypeKind,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    if ak == fk {
        return Rank::Equal;
    }
    if ak.is_int_family() {
        // Crossing into the platform `int` is a conversion; the platform
        // `int` itself fits the fixed widths that can hold it everywhere.
        if fk == TypeKind::Int {
            return Rank::Convertible;
        }
        if ak == TypeKind::Int {
            return if matches!(fk, TypeKind::Int32 | TypeKind::Int64) {
                Rank::Subtype
            } else {
                Rank::None
            };
        }
        let (wf, wa) = (fk.int_width().unwrap_or(0), ak.int_width().unwrap_or(0));
        return if wa < wf { Rank::Subtype } else { Rank::None };
    }
    if ak.is_float_family() {
        return Rank::Convertible;
    }
    if ak == TypeKind::Range {
        let base = range_base(arena, actual);
        if arena.typ(base).kind == fk {
            return Rank::Subtype;
        }
        return if type_rel(arena, map, formal, base) >= Rank::Convertible {
            Rank::Convertible
        } else {
            Rank::None
        };
    }
    Rank::None
}

fn float_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    fk: TypeKind,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    if ak == fk {
        return Rank::Equal;
    }
    if ak.is_float_family() {
        if fk == TypeKind::Float {
            return Rank::Convertible;
        }
        if ak == TypeKind::Float {
            // The platform float is 64-bit; widening it is safe, matching
            // its own width is a convention change only.
            return match fk {
                TypeKind::Float128 => Rank::Subtype,
                TypeKind::Float64 => Rank::Convertible,
                _ => Rank::None,
            };
        }
        let (wf, wa) = (float_width(fk), float_width(ak));
        return if wa < wf { Rank::Subtype } else { Rank::None };
    }
    if ak.is_int_family() {
        return Rank::Convertible;
    }
    if ak == TypeKind::Range {
        let base = range_base(arena, actual);
        return if type_rel(arena, map, formal, base) >= Rank::Convertible {
            Rank::Convertible
        } else {
            Rank::None
        };
    }
    Rank::None
}

fn float_width(k: TypeKind) -> u32 {
    match k {
        TypeKind::Float32 => 32,
        TypeKind::Float | TypeKind::Float64 => 64,
        TypeKind::Float128 => 128,
        _ => 0,
    }
}

fn array_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    let fe = elem_or_nil(arena, formal);
    match ak {
        TypeKind::Array => {
            let f_index = index_or_nil(arena, formal);
            let a_index = index_or_nil(arena, actual);
            let ae = elem_or_nil(arena, actual);
            let ri = type_rel(arena, map, f_index, a_index);
            if ri == Rank::None {
                return Rank::None;
            }
            let re = type_rel(arena, map, fe, ae);
            if re == Rank::None {
                return Rank::None;
            }
            ri.weaker(re)
        }
        TypeKind::ArrayConstr => {
            let ae = elem_or_nil(arena, actual);
            let re = type_rel(arena, map, fe, ae);
            if re == Rank::None {
                return Rank::None;
            }
            if re != Rank::Generic && array_len(arena, formal) != array_len(arena, actual) {
                return Rank::None;
            }
            re
        }
        _ => Rank::None,
    }
}

fn open_array_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    let fe = elem_or_nil(arena, formal);
    match ak {
        TypeKind::OpenArray => {
            let ae = elem_or_nil(arena, actual);
            type_rel(arena, map, fe, ae)
        }
        TypeKind::Array | TypeKind::ArrayConstr | TypeKind::Sequence => {
            if ak == TypeKind::ArrayConstr && array_len(arena, actual) == Some(0) {
                return Rank::Convertible;
            }
            let ae = elem_or_nil(arena, actual);
            match type_rel(arena, map, fe, ae) {
                Rank::Generic => Rank::Generic,
                // The element layout must be identical under the pointer,
                // so only exact elements convert.
                Rank::Equal => Rank::Convertible,
                _ => Rank::None,
            }
        }
        _ => Rank::None,
    }
}

fn seq_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    match ak {
        TypeKind::Sequence => {
            let fe = elem_or_nil(arena, formal);
            let ae = elem_or_nil(arena, actual);
            match type_rel(arena, map, fe, ae) {
                Rank::Equal => Rank::Equal,
                Rank::Generic => Rank::Generic,
                _ => Rank::None,
            }
        }
        TypeKind::Nil => Rank::Subtype,
        TypeKind::EmptySet => Rank::Subtype,
        TypeKind::ArrayConstr if array_len(arena, actual) == Some(0) => Rank::Subtype,
        _ => Rank::None,
    }
}

fn tuple_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    if ak != TypeKind::Tuple {
        return Rank::None;
    }
    let f_sons = arena.typ(formal).sons.clone();
    let a_sons = arena.typ(actual).sons.clone();
    if a_sons.len() < f_sons.len() {
        return Rank::None;
    }
    let mut result = Rank::Equal;
    for (&fs, &as_) in f_sons.iter().zip(a_sons.iter()) {
        let r = type_rel(arena, map, fs, as_);
        if r < Rank::Subtype {
            return Rank::None;
        }
        result = result.weaker(r);
    }
    if a_sons.len() > f_sons.len() {
        result = result.weaker(Rank::Subtype);
    }
    result
}

fn record_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    match ak {
        TypeKind::Record => {
            let f_sons = arena.typ(formal).sons.clone();
            let a_sons = arena.typ(actual).sons.clone();
            if f_sons.len() != a_sons.len() || !record_field_names_match(arena, formal, actual) {
                return Rank::None;
            }
            let mut result = Rank::Equal;
            for (&fs, &as_) in f_sons.iter().zip(a_sons.iter()) {
                let r = type_rel(arena, map, fs, as_);
                if r < Rank::Subtype {
                    return Rank::None;
                }
                result = result.weaker(r);
            }
            result
        }
        TypeKind::RecordConstr => record_constr_rel(arena, map, formal, actual),
        _ => Rank::None,
    }
}

/// Record vs record-constructor: every named field of the constructor must
/// land on a distinct formal field; formal fields without a counterpart
/// need a default; leftover constructor fields reject.
fn record_constr_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
) -> Rank {
    let Some(f_fields) = field_syms(arena, formal) else {
        return Rank::None;
    };
    let Some(a_names) = constr_field_names(arena, actual) else {
        return Rank::None;
    };
    let a_types = arena.typ(actual).sons.clone();
    if a_names.len() != a_types.len() {
        return Rank::None;
    }
    let mut used = cinder_ast::IntSet::new();
    let mut used_count = 0usize;
    let mut result = Rank::Subtype;
    for field in f_fields {
        let f_ident = arena.sym(field).ident;
        let f_type = arena.sym(field).typ.unwrap_or(TypeId::NIL);
        let pos = a_names
            .iter()
            .position(|&ident| ident == f_ident)
            .filter(|_| !used.contains(i64::from(f_ident.id())));
        match pos {
            Some(pos) => {
                used.incl(i64::from(f_ident.id()));
                used_count += 1;
                let r = type_rel(arena, map, f_type, a_types[pos]);
                if r < Rank::Convertible {
                    return Rank::None;
                }
                result = result.weaker(r.min(Rank::Subtype));
            }
            None => {
                // No (unconsumed) constructor field with this name: the
                // formal field must have a default.
                if field_default(arena, field).is_none() {
                    return Rank::None;
                }
            }
        }
    }
    if used_count != a_names.len() {
        return Rank::None; // unvisited constructor fields
    }
    result
}

fn ptr_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    fk: TypeKind,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    if ak == TypeKind::Nil {
        return Rank::Subtype;
    }
    if ak == fk {
        let fe = elem_or_nil(arena, formal);
        let ae = elem_or_nil(arena, actual);
        if same_type(arena, fe, ae) {
            return Rank::Equal;
        }
        if !fe.is_nil()
            && !ae.is_nil()
            && arena.typ(fe).kind == TypeKind::Object
            && arena.typ(ae).kind == TypeKind::Object
            && inherits_from(arena, ae, fe)
        {
            return Rank::Subtype;
        }
        // A generic element still unifies through the pointer.
        if arena.typ(fe).kind == TypeKind::GenericParam {
            return type_rel(arena, map, fe, ae).weaker(Rank::Generic);
        }
        return Rank::None;
    }
    if fk == TypeKind::Ptr {
        let fe = elem_or_nil(arena, formal);
        if !fe.is_nil()
            && arena.typ(fe).kind == TypeKind::Char
            && ak == TypeKind::Array
            && is_zero_based_char_array(arena, actual)
        {
            return Rank::Convertible;
        }
    }
    Rank::None
}

fn proc_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    match ak {
        TypeKind::Nil => Rank::Subtype,
        TypeKind::Proc => {
            let f_sons = arena.typ(formal).sons.clone();
            let a_sons = arena.typ(actual).sons.clone();
            if f_sons.len() != a_sons.len() {
                return Rank::None;
            }
            if arena.typ(formal).callconv != arena.typ(actual).callconv {
                return Rank::None;
            }
            let mut result = Rank::Equal;
            for (&fp, &ap) in f_sons[1..].iter().zip(a_sons[1..].iter()) {
                match type_rel(arena, map, fp, ap) {
                    Rank::Equal => {}
                    Rank::Generic => result = result.weaker(Rank::Generic),
                    Rank::None => {
                        // Limited contravariance: accept when the actual's
                        // parameter is a supertype of the formal's, at the
                        // price of an overall demotion.
                        if type_rel(arena, map, ap, fp) == Rank::Subtype {
                            result = result.weaker(Rank::Convertible);
                        } else {
                            return Rank::None;
                        }
                    }
                    _ => result = result.weaker(Rank::Convertible),
                }
            }
            let (f_ret, a_ret) = (f_sons[0], a_sons[0]);
            if f_ret.is_nil() != a_ret.is_nil() {
                return Rank::None;
            }
            if !f_ret.is_nil() {
                match type_rel(arena, map, f_ret, a_ret) {
                    Rank::None => return Rank::None,
                    Rank::Subtype => result = result.weaker(Rank::Convertible),
                    r => result = result.weaker(r),
                }
            }
            result
        }
        _ => Rank::None,
    }
}

fn generic_param_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
) -> Rank {
    if let Some(&bound) = map.get(formal.id()) {
        // Already bound: the actual must fit what was chosen. Implicit
        // conversions do not count here, which is what refuses `f(1, 2.0)`
        // against `proc f[T](x, y: T)`.
        let r = type_rel(arena, map, bound, actual);
        return if r >= Rank::Subtype { r.weaker(Rank::Generic) } else { Rank::None };
    }
    let Some(concrete) = concretise(arena, actual) else {
        return Rank::None;
    };
    let constraints = arena.typ(formal).sons.clone();
    if constraints.is_empty() {
        map.insert(formal.id(), concrete);
        return Rank::Generic;
    }
    for c in constraints {
        if type_rel(arena, map, c, concrete) >= Rank::Subtype {
            map.insert(formal.id(), concrete);
            return Rank::Generic;
        }
    }
    Rank::None
}

fn generic_rel(
    arena: &mut AstArena,
    map: &mut Bindings,
    formal: TypeId,
    actual: TypeId,
    ak: TypeKind,
) -> Rank {
    if ak != TypeKind::GenericInst {
        return Rank::None;
    }
    let container = arena.typ(formal).container_id.unwrap_or(formal);
    if arena.typ(actual).container_id != Some(container) {
        return Rank::None;
    }
    let f_params = arena.typ(formal).sons.clone();
    let a_sons = arena.typ(actual).sons.clone();
    if a_sons.len() != f_params.len() + 1 {
        return Rank::None; // args plus the body slot
    }
    for (&fp, &aa) in f_params.iter().zip(a_sons.iter()) {
        if type_rel(arena, map, fp, aa) < Rank::Generic {
            return Rank::None;
        }
    }
    Rank::Generic
}

/// Binds-to form of an actual type: constructor types concretise to the
/// container they will become; `nil` and the empty set carry too little
/// information to bind.
fn concretise(arena: &mut AstArena, actual: TypeId) -> Option<TypeId> {
    match arena.typ(actual).kind {
        TypeKind::Nil | TypeKind::EmptySet => None,
        TypeKind::ArrayConstr => {
            let elem = elem_or_nil(arena, actual);
            Some(arena.add_type(Type::with_sons(TypeKind::OpenArray, vec![elem])))
        }
        TypeKind::RecordConstr => {
            let ty = arena.typ(actual);
            let (sons, n) = (ty.sons.clone(), ty.n);
            let mut rec = Type::with_sons(TypeKind::Record, sons);
            rec.n = n;
            Some(arena.add_type(rec))
        }
        _ => Some(actual),
    }
}

/// Substitutes bound generic parameters throughout a type, building fresh
/// descriptors only where something actually changed.
pub fn apply_bindings(arena: &mut AstArena, map: &Bindings, t: TypeId) -> TypeId {
    let mut in_progress = cinder_ast::IntSet::new();
    substitute(arena, map, t, &mut in_progress)
}

fn substitute(
    arena: &mut AstArena,
    map: &Bindings,
    t: TypeId,
    in_progress: &mut cinder_ast::IntSet,
) -> TypeId {
    if t.is_nil() {
        return t;
    }
    if arena.typ(t).kind == TypeKind::GenericParam {
        return map.get(t.id()).copied().unwrap_or(t);
    }
    if arena.typ(t).sons.is_empty() {
        return t;
    }
    // Cyclic structural types (a record reaching itself through a ref)
    // cannot carry generic parameters on the cycle; break it here.
    if !in_progress.incl(i64::from(t.id())) {
        return t;
    }
    let sons = arena.typ(t).sons.clone();
    let new_sons: Vec<TypeId> =
        sons.iter().map(|&s| substitute(arena, map, s, in_progress)).collect();
    in_progress.excl(i64::from(t.id()));
    if new_sons == sons {
        return t;
    }
    let template = arena.typ(t).clone();
    arena.add_type(Type { sons: new_sons, size: -1, align: -1, ..template })
}

/// Whether a type still mentions unsubstituted generic parameters.
pub fn is_generic_type(arena: &AstArena, t: TypeId) -> bool {
    fn walk(arena: &AstArena, t: TypeId, visited: &mut cinder_ast::IntSet) -> bool {
        if t.is_nil() || !visited.incl(i64::from(t.id())) {
            return false;
        }
        let ty = arena.typ(t);
        if ty.kind == TypeKind::GenericParam {
            return true;
        }
        ty.sons.iter().any(|&s| walk(arena, s, visited))
    }
    walk(arena, t, &mut cinder_ast::IntSet::new())
}

// ----------------------------------------------------------------------
// Small helpers
// ----------------------------------------------------------------------

fn elem_or_nil(arena: &AstArena, t: TypeId) -> TypeId {
    elem_type(arena, t).unwrap_or(TypeId::NIL)
}

fn index_or_nil(arena: &AstArena, t: TypeId) -> TypeId {
    arena.typ(t).sons.first().copied().unwrap_or(TypeId::NIL)
}

fn range_base(arena: &AstArena, t: TypeId) -> TypeId {
    base_of(arena, t).unwrap_or(TypeId::NIL)
}

fn is_zero_based_char_array(arena: &AstArena, t: TypeId) -> bool {
    let index = index_or_nil(arena, t);
    let elem = elem_or_nil(arena, t);
    if index.is_nil() || elem.is_nil() || arena.typ(elem).kind != TypeKind::Char {
        return false;
    }
    let ik = arena.typ(index).kind;
    let int_indexed = match ik {
        TypeKind::Range => base_of(arena, index)
            .map(|b| arena.typ(b).kind.is_int_family())
            .unwrap_or(false),
        k => k.is_int_family(),
    };
    int_indexed && first_ord(arena, index) == 0
}

fn field_syms(arena: &AstArena, t: TypeId) -> Option<Vec<cinder_ast::SymId>> {
    let n = arena.typ(t).n?;
    let mut out = Vec::new();
    for &field in arena.node(n).sons() {
        if field.is_nil() {
            continue;
        }
        out.push(arena.node(field).sym()?);
    }
    Some(out)
}

/// Constructor field names, from the `ExprColonExpr` pairs of the
/// constructor node.
fn constr_field_names(arena: &AstArena, t: TypeId) -> Option<Vec<cinder_base::Ident>> {
    let n = arena.typ(t).n?;
    let mut out = Vec::new();
    for &pair in arena.node(n).sons() {
        if pair.is_nil() {
            return None;
        }
        let name = arena.node(pair).sons().first().copied()?;
        if name.is_nil() {
            return None;
        }
        let ident = arena.node(name).ident().or_else(|| {
            arena.node(name).sym().map(|s| arena.sym(s).ident)
        })?;
        out.push(ident);
    }
    Some(out)
}

fn field_default(arena: &AstArena, field: cinder_ast::SymId) -> Option<cinder_ast::NodeId> {
    let def = arena.sym(field).def?;
    let node = arena.node(def);
    if node.kind != cinder_ast::NodeKind::IdentDefs {
        return None;
    }
    node.sons().last().copied().filter(|d| !d.is_nil())
}
