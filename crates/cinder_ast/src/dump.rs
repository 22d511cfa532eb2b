//! JSON debug dump of trees and types.
//!
//! Strictly a debugging aid: the output format is not stable and nothing in
//! the compiler consumes it. Types can be cyclic (an object's field type
//! may lead back to the object through a `Ref`), so the walk carries a
//! visited set and emits `{"ref": id}` stubs on re-entry.

use serde_json::{json, Value};

use cinder_base::IdentPool;

use crate::arena::AstArena;
use crate::node::{NodeId, Payload};
use crate::tables::IntSet;
use crate::types::TypeId;

/// Renders a subtree as a JSON value.
pub fn dump_node(arena: &AstArena, pool: &IdentPool, n: NodeId) -> Value {
    let mut visited = IntSet::new();
    node_value(arena, pool, n, &mut visited)
}

/// Renders a type descriptor as a JSON value.
pub fn dump_type(arena: &AstArena, pool: &IdentPool, t: TypeId) -> Value {
    let mut visited = IntSet::new();
    type_value(arena, pool, t, &mut visited)
}

fn node_value(arena: &AstArena, pool: &IdentPool, n: NodeId, visited: &mut IntSet) -> Value {
    if n.is_nil() {
        return Value::Null;
    }
    if !visited.incl(i64::from(n.id())) {
        return json!({ "ref": n.id() });
    }
    let node = arena.node(n);
    let mut obj = serde_json::Map::new();
    obj.insert("kind".into(), json!(format!("{:?}", node.kind)));
    if !node.loc.is_unknown() {
        obj.insert("line".into(), json!(node.loc.line));
        obj.insert("col".into(), json!(node.loc.col));
    }
    if let Some(t) = node.typ {
        obj.insert("typ".into(), json!(format!("{:?}", arena.typ(t).kind)));
    }
    if let Some(comment) = &node.comment {
        obj.insert("comment".into(), json!(comment));
    }
    match &node.payload {
        Payload::None => {}
        Payload::Int(v) => {
            obj.insert("intVal".into(), json!(v));
        }
        Payload::Float(v) => {
            obj.insert("floatVal".into(), json!(v));
        }
        Payload::Str(s) => {
            obj.insert("strVal".into(), json!(s));
        }
        Payload::Ident(id) => {
            obj.insert("ident".into(), json!(pool.resolve(*id)));
        }
        Payload::Sym(s) => {
            obj.insert("sym".into(), json!(pool.resolve(arena.sym(*s).ident)));
            obj.insert("symId".into(), json!(s.id()));
        }
        Payload::Sons(sons) => {
            let sons: Vec<Value> =
                sons.iter().map(|&son| node_value(arena, pool, son, visited)).collect();
            obj.insert("sons".into(), Value::Array(sons));
        }
    }
    Value::Object(obj)
}

fn type_value(arena: &AstArena, pool: &IdentPool, t: TypeId, visited: &mut IntSet) -> Value {
    if t.is_nil() {
        return Value::Null;
    }
    if !visited.incl(i64::from(t.id())) {
        return json!({ "ref": t.id() });
    }
    let ty = arena.typ(t);
    let mut obj = serde_json::Map::new();
    obj.insert("kind".into(), json!(format!("{:?}", ty.kind)));
    obj.insert("id".into(), json!(t.id()));
    if let Some(sym) = ty.sym {
        obj.insert("sym".into(), json!(pool.resolve(arena.sym(sym).ident)));
    }
    if !ty.sons.is_empty() {
        let sons: Vec<Value> =
            ty.sons.iter().map(|&son| type_value(arena, pool, son, visited)).collect();
        obj.insert("sons".into(), Value::Array(sons));
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_base::SourceLoc;

    use crate::node::NodeKind;
    use crate::types::{Type, TypeKind};

    #[test]
    fn dump_renders_literals_and_sons() {
        let mut arena = AstArena::new();
        let mut pool = IdentPool::new();
        let f = pool.intern("f");
        let callee = arena.ident_node(SourceLoc::UNKNOWN, f);
        let arg = arena.int_lit(SourceLoc::UNKNOWN, 3, None);
        let call = arena.tree(NodeKind::Call, SourceLoc::UNKNOWN, vec![callee, arg]);
        let v = dump_node(&arena, &pool, call);
        assert_eq!(v["kind"], "Call");
        assert_eq!(v["sons"][0]["ident"], "f");
        assert_eq!(v["sons"][1]["intVal"], 3);
    }

    #[test]
    fn dump_nil_is_null() {
        let arena = AstArena::new();
        let pool = IdentPool::new();
        assert_eq!(dump_node(&arena, &pool, NodeId::NIL), Value::Null);
    }

    #[test]
    fn cyclic_types_terminate() {
        let mut arena = AstArena::new();
        let pool = IdentPool::new();
        // object ← ref ← field of the same object
        let obj = arena.add_type(Type::new(TypeKind::Object));
        let rf = arena.new_type_with(TypeKind::Ref, vec![obj]);
        arena.typ_mut(obj).sons = vec![TypeId::NIL, rf];
        let v = dump_type(&arena, &pool, obj);
        assert_eq!(v["kind"], "Object");
        assert_eq!(v["sons"][1]["sons"][0]["ref"], obj.id());
    }
}
