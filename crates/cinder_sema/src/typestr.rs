//! Human-readable type and signature rendering for diagnostics.
//!
//! This is the single point of truth for how a type reads in an error
//! message. Declared types print their name; structural types print their
//! shape.

use cinder_ast::types::{self, TypeFlags};
use cinder_ast::{AstArena, SymId, TypeId, TypeKind};
use cinder_base::IdentPool;

/// Renders a type the way diagnostics spell it.
pub fn type_to_string(arena: &AstArena, pool: &IdentPool, t: TypeId) -> String {
    if t.is_nil() {
        return "void".into();
    }
    let ty = arena.typ(t);
    if let Some(sym) = ty.sym {
        if ty.kind.is_nominal() {
            return pool.resolve(arena.sym(sym).ident).to_string();
        }
    }
    match ty.kind {
        TypeKind::Bool => "bool".into(),
        TypeKind::Char => "char".into(),
        TypeKind::Enum => "enum".into(),
        TypeKind::AnyEnum => "enum".into(),
        TypeKind::Int => "int".into(),
        TypeKind::Int8 => "int8".into(),
        TypeKind::Int16 => "int16".into(),
        TypeKind::Int32 => "int32".into(),
        TypeKind::Int64 => "int64".into(),
        TypeKind::Float => "float".into(),
        TypeKind::Float32 => "float32".into(),
        TypeKind::Float64 => "float64".into(),
        TypeKind::Float128 => "float128".into(),
        TypeKind::String => "string".into(),
        TypeKind::CString => "cstring".into(),
        TypeKind::Pointer => "pointer".into(),
        TypeKind::Nil => "nil".into(),
        TypeKind::EmptySet => "empty set".into(),
        TypeKind::Forward => "forward-declared type".into(),
        TypeKind::Array => {
            let index = son_str(arena, pool, ty.sons.first());
            let elem = son_str(arena, pool, ty.sons.get(1));
            format!("array[{index}, {elem}]")
        }
        TypeKind::ArrayConstr => {
            let elem = son_str(arena, pool, ty.sons.get(1));
            let len = types::array_len(arena, t).unwrap_or(0);
            format!("array constructor of {len} x {elem}")
        }
        TypeKind::OpenArray => format!("openArray[{}]", son_str(arena, pool, ty.sons.first())),
        TypeKind::Sequence => format!("seq[{}]", son_str(arena, pool, ty.sons.first())),
        TypeKind::Set => format!("set[{}]", son_str(arena, pool, ty.sons.first())),
        TypeKind::Tuple => {
            let elems: Vec<String> =
                ty.sons.iter().map(|&s| type_to_string(arena, pool, s)).collect();
            format!("tuple[{}]", elems.join(", "))
        }
        TypeKind::Record | TypeKind::RecordConstr => record_str(arena, pool, t),
        TypeKind::Object => "object".into(),
        TypeKind::Ref => format!("ref {}", son_str(arena, pool, ty.sons.first())),
        TypeKind::Ptr => format!("ptr {}", son_str(arena, pool, ty.sons.first())),
        TypeKind::Var => format!("var {}", son_str(arena, pool, ty.sons.first())),
        TypeKind::Distinct => format!("distinct {}", son_str(arena, pool, ty.sons.first())),
        TypeKind::Proc => proc_str(arena, pool, t),
        TypeKind::Range => {
            let lo = types::first_ord(arena, t);
            let hi = types::last_ord(arena, t);
            format!("range[{lo}..{hi}]")
        }
        TypeKind::Generic | TypeKind::GenericParam => "generic".into(),
        TypeKind::GenericInst => {
            let base = ty
                .container_id
                .map(|c| type_to_string(arena, pool, c))
                .unwrap_or_else(|| "generic".into());
            let args: Vec<String> = ty.sons[..ty.sons.len().saturating_sub(1)]
                .iter()
                .map(|&s| type_to_string(arena, pool, s))
                .collect();
            format!("{base}[{}]", args.join(", "))
        }
    }
}

fn son_str(arena: &AstArena, pool: &IdentPool, son: Option<&TypeId>) -> String {
    match son {
        Some(&s) if !s.is_nil() => type_to_string(arena, pool, s),
        _ => "void".into(),
    }
}

fn record_str(arena: &AstArena, pool: &IdentPool, t: TypeId) -> String {
    let ty = arena.typ(t);
    let mut fields = Vec::new();
    if let Some(n) = ty.n {
        for (i, &field) in arena.node(n).sons().iter().enumerate() {
            if field.is_nil() {
                continue;
            }
            let name = arena
                .node(field)
                .sym()
                .map(|s| pool.resolve(arena.sym(s).ident).to_string())
                .unwrap_or_else(|| "?".into());
            let fty = son_str(arena, pool, ty.sons.get(i));
            fields.push(format!("{name}: {fty}"));
        }
    }
    format!("record[{}]", fields.join(", "))
}

fn proc_str(arena: &AstArena, pool: &IdentPool, t: TypeId) -> String {
    let ty = arena.typ(t);
    let params: Vec<String> =
        ty.sons[1..].iter().map(|&s| type_to_string(arena, pool, s)).collect();
    let mut out = format!("proc ({})", params.join(", "));
    if let Some(&ret) = ty.sons.first() {
        if !ret.is_nil() {
            out.push_str(": ");
            out.push_str(&type_to_string(arena, pool, ret));
        }
    }
    if ty.flags.contains(TypeFlags::VARARGS) {
        out.push_str(" {.varargs.}");
    }
    out
}

/// `proc f(x: int): float` - the way the ambiguity diagnostic lists a
/// candidate.
pub fn sym_signature(arena: &AstArena, pool: &IdentPool, sym: SymId) -> String {
    let s = arena.sym(sym);
    let name = pool.resolve(s.ident);
    match s.typ {
        Some(t) if arena.typ(t).kind == TypeKind::Proc => {
            let ty = arena.typ(t);
            let mut params = Vec::new();
            if let Some(n) = ty.n {
                for (i, &defs) in arena.node(n).sons().iter().skip(1).enumerate() {
                    let pname = param_name(arena, pool, defs);
                    let pty = son_str(arena, pool, ty.sons.get(i + 1));
                    params.push(format!("{pname}: {pty}"));
                }
            } else {
                for &p in &ty.sons[1..] {
                    params.push(type_to_string(arena, pool, p));
                }
            }
            let mut out = format!("proc {name}({})", params.join(", "));
            if let Some(&ret) = ty.sons.first() {
                if !ret.is_nil() {
                    out.push_str(": ");
                    out.push_str(&type_to_string(arena, pool, ret));
                }
            }
            out
        }
        Some(t) => format!("{name}: {}", type_to_string(arena, pool, t)),
        None => name.to_string(),
    }
}

fn param_name(arena: &AstArena, pool: &IdentPool, defs: cinder_ast::NodeId) -> String {
    if defs.is_nil() {
        return "?".into();
    }
    arena
        .node(defs)
        .sons()
        .first()
        .filter(|s| !s.is_nil())
        .and_then(|&s| arena.node(s).sym())
        .map(|s| pool.resolve(arena.sym(s).ident).to_string())
        .unwrap_or_else(|| "?".into())
}
