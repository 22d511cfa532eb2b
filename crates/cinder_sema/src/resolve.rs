//! Overload resolution and generic instantiation.
//!
//! [`resolve_call`] enumerates the overload set of the callee name in
//! deterministic order (innermost scope first, insertion order within a
//! scope), scores every candidate with the matcher, and keeps the best
//! candidate and the runner-up. Quality is lexicographic over the tallies
//! `(exact, generic, subtype, conv)`; a tie at the end is an
//! ambiguous-call diagnostic carrying both signatures.
//!
//! A generic winner is instantiated against its accumulated bindings.
//! Instances are cached by (generic id, normalised bindings) so repeated
//! call sites reuse one instance instead of re-instantiating exponentially.

use std::cmp::Ordering;

use cinder_ast::{NodeId, NodeKind, Payload, SymFlags, SymId, SymKind, TypeId};
use cinder_base::Ident;
use rustc_hash::FxHashMap;

use crate::ctx::SemCtx;
use crate::diag::DiagKind;
use crate::sigmatch::{cmp_candidates, match_call, Candidate, MatchState};
use crate::typerel::{apply_bindings, is_generic_type, Bindings};
use crate::typestr::{sym_signature, type_to_string};

/// Resolves one call node. On success returns the rewritten call (arguments
/// in formal order, defaults filled, hidden conversions applied) whose type
/// is the winner's return type.
///
/// Returns `None` without a diagnostic when the name is in scope but
/// nothing callable answers to it (a downstream pass may still try a
/// user-defined call operator); reports a diagnostic for every other
/// failure.
pub fn resolve_call(ctx: &mut SemCtx, call: NodeId) -> Option<NodeId> {
    let loc = ctx.arena.node(call).loc;
    let Some(&callee) = ctx.arena.node(call).sons().first() else {
        ctx.diags
            .report(loc, DiagKind::InternalError { message: "call node without callee".into() });
        return None;
    };
    let Some(ident) = callee_ident(ctx, callee) else {
        ctx.diags.report(
            loc,
            DiagKind::Generated { message: "called expression is not a routine name".into() },
        );
        return None;
    };

    let syms = ctx.scopes.all_named(&ctx.idents, ident);
    if syms.is_empty() {
        ctx.diags.report(
            loc,
            DiagKind::UndeclaredIdentifier { name: ctx.idents.resolve(ident).to_string() },
        );
        return None;
    }

    let mut best: Option<Candidate> = None;
    let mut alt: Option<Candidate> = None;
    let mut tried: Vec<SymId> = Vec::new();

    for sym in syms {
        if !ctx.arena.sym(sym).kind.is_callable() {
            continue;
        }
        tried.push(sym);
        let mut z = Candidate::new(&ctx.arena, sym);
        match_call(ctx, call, &mut z);
        log::trace!(
            "candidate {}: {:?} score {:?}",
            sym_signature(&ctx.arena, &ctx.idents, sym),
            z.state,
            z.score()
        );
        if z.state == MatchState::Match {
            match &best {
                Some(b) if b.state == MatchState::Match => match cmp_candidates(&z, b) {
                    Ordering::Greater => {
                        alt = best.take();
                        best = Some(z);
                    }
                    Ordering::Equal => alt = Some(z),
                    Ordering::Less => {}
                },
                _ => best = Some(z),
            }
        } else if best.is_none() {
            // Keep the first failure so its reason can be surfaced once the
            // whole set has been scored.
            best = Some(z);
        }
    }

    let Some(best) = best else {
        // State "empty": nothing callable under this name. Not an error
        // here.
        return None;
    };

    if best.state != MatchState::Match {
        let kind = best.failure.clone().unwrap_or_else(|| DiagKind::TypeMismatch {
            expected: tried
                .iter()
                .map(|&s| sym_signature(&ctx.arena, &ctx.idents, s))
                .collect::<Vec<_>>()
                .join("\n"),
            got: actual_types_str(ctx, call),
        });
        ctx.diags.report(loc, kind);
        return None;
    }

    if let Some(alt) = &alt {
        if alt.state == MatchState::Match && cmp_candidates(&best, alt) == Ordering::Equal {
            ctx.diags.report(
                loc,
                DiagKind::AmbiguousCall {
                    first: sym_signature(&ctx.arena, &ctx.idents, best.sym),
                    second: sym_signature(&ctx.arena, &ctx.idents, alt.sym),
                },
            );
            return None;
        }
    }

    ctx.arena.sym_mut(best.sym).flags |= SymFlags::USED;
    let winner = if is_generic_type(&ctx.arena, best.proc_type) {
        generate_instance(ctx, best.sym, &best.bindings)
    } else {
        best.sym
    };

    let new_callee = ctx.arena.sym_node(loc, winner);
    if let Some(sons) = ctx.arena.node_mut(best.call).sons_mut() {
        sons[0] = new_callee;
    }
    log::debug!(
        "resolved call at {loc} to {}",
        sym_signature(&ctx.arena, &ctx.idents, winner)
    );
    Some(best.call)
}

fn callee_ident(ctx: &SemCtx, callee: NodeId) -> Option<Ident> {
    if callee.is_nil() {
        return None;
    }
    let node = ctx.arena.node(callee);
    match node.kind {
        NodeKind::Ident => node.ident(),
        NodeKind::Sym => node.sym().map(|s| ctx.arena.sym(s).ident),
        _ => None,
    }
}

fn actual_types_str(ctx: &SemCtx, call: NodeId) -> String {
    let types: Vec<String> = ctx
        .arena
        .node(call)
        .sons()
        .iter()
        .skip(1)
        .map(|&a| {
            if a.is_nil() {
                "void".to_string()
            } else {
                match ctx.arena.node(a).typ {
                    Some(t) => type_to_string(&ctx.arena, &ctx.idents, t),
                    None => "untyped".to_string(),
                }
            }
        })
        .collect();
    format!("({})", types.join(", "))
}

/// Builds (or reuses) the concrete instance of a generic routine under the
/// given bindings.
pub fn generate_instance(ctx: &mut SemCtx, generic: SymId, bindings: &Bindings) -> SymId {
    let key = (generic.id(), normalised(bindings));
    if let Some(&inst) = ctx.instances.get(&key) {
        return inst;
    }
    let ptype = ctx.arena.sym(generic).typ.unwrap_or(TypeId::NIL);
    let (new_type, sym_map) = instantiate_proc_type(ctx, ptype, bindings);

    let mut inst = ctx.arena.sym(generic).clone();
    inst.typ = if new_type.is_nil() { None } else { Some(new_type) };
    inst.flags |= SymFlags::USED | SymFlags::FROM_INSTANTIATION;
    inst.owner = Some(generic);
    if inst.kind == SymKind::Unknown {
        inst.kind = SymKind::Proc;
    }
    let def = inst.def;
    let id = ctx.arena.add_sym(inst);
    if let Some(def) = def {
        let copied = ctx.arena.copy_tree(def);
        retype_tree(ctx, copied, bindings, &sym_map);
        ctx.arena.sym_mut(id).def = Some(copied);
    }
    ctx.instances.insert(key, id);
    log::debug!(
        "instantiated {} as {}",
        sym_signature(&ctx.arena, &ctx.idents, generic),
        sym_signature(&ctx.arena, &ctx.idents, id)
    );
    id
}

/// Bindings in canonical order, for the instance-cache key.
fn normalised(bindings: &Bindings) -> Vec<(u32, u32)> {
    let mut v: Vec<(u32, u32)> = bindings.iter().map(|(k, t)| (k, t.id())).collect();
    v.sort_unstable();
    v
}

/// Substitutes the proc type and rebuilds its parameter list with fresh,
/// concretely-typed parameter symbols. Returns the new type and the
/// template-param → instance-param symbol mapping.
fn instantiate_proc_type(
    ctx: &mut SemCtx,
    t: TypeId,
    bindings: &Bindings,
) -> (TypeId, FxHashMap<u32, SymId>) {
    let mut sym_map = FxHashMap::default();
    if t.is_nil() {
        return (t, sym_map);
    }
    let substituted = apply_bindings(&mut ctx.arena, bindings, t);
    let Some(n) = ctx.arena.typ(t).n else {
        return (substituted, sym_map);
    };

    let old_defs = ctx.arena.node(n).sons().to_vec();
    let mut new_defs = vec![NodeId::NIL];
    for &defs in old_defs.iter().skip(1) {
        if defs.is_nil() {
            new_defs.push(NodeId::NIL);
            continue;
        }
        let sons = ctx.arena.node(defs).sons().to_vec();
        let Some(old_sym) = sons.first().filter(|s| !s.is_nil()).and_then(|&s| ctx.arena.node(s).sym())
        else {
            new_defs.push(ctx.arena.copy_tree(defs));
            continue;
        };
        let mut psym = ctx.arena.sym(old_sym).clone();
        psym.typ = psym.typ.map(|pt| apply_bindings(&mut ctx.arena, bindings, pt));
        let new_sym = ctx.arena.add_sym(psym);
        sym_map.insert(old_sym.id(), new_sym);
        let loc = ctx.arena.node(defs).loc;
        let sym_node = ctx.arena.sym_node(loc, new_sym);
        let default = sons.last().copied().unwrap_or(NodeId::NIL);
        let default = if default.is_nil() { NodeId::NIL } else { ctx.arena.copy_tree(default) };
        let identdefs =
            ctx.arena.tree(NodeKind::IdentDefs, loc, vec![sym_node, NodeId::NIL, default]);
        ctx.arena.sym_mut(new_sym).def = Some(identdefs);
        new_defs.push(identdefs);
    }
    let new_n = ctx.arena.tree(NodeKind::FormalParams, cinder_base::SourceLoc::UNKNOWN, new_defs);

    // The instance owns its descriptor even when no son changed.
    let mut ty = ctx.arena.typ(substituted).clone();
    ty.n = Some(new_n);
    let new_t = ctx.arena.add_type(ty);
    (new_t, sym_map)
}

/// Walks an instantiated body: node types are substituted under the
/// bindings and references to template parameters are redirected to the
/// instance's parameters.
fn retype_tree(
    ctx: &mut SemCtx,
    n: NodeId,
    bindings: &Bindings,
    sym_map: &FxHashMap<u32, SymId>,
) {
    if n.is_nil() {
        return;
    }
    if let Some(t) = ctx.arena.node(n).typ {
        let nt = apply_bindings(&mut ctx.arena, bindings, t);
        ctx.arena.node_mut(n).typ = Some(nt);
    }
    if let Some(old) = ctx.arena.node(n).sym() {
        if let Some(&new) = sym_map.get(&old.id()) {
            let typ = ctx.arena.sym(new).typ;
            let node = ctx.arena.node_mut(n);
            node.payload = Payload::Sym(new);
            node.typ = typ;
        }
    }
    for son in ctx.arena.node(n).sons().to_vec() {
        retype_tree(ctx, son, bindings, sym_map);
    }
}
