//! Call-site parameter matching.
//!
//! [`match_call`] walks the actual arguments of a call against one
//! candidate's formal parameters and builds the rewritten call as it goes:
//! arguments land in formal positional order, defaults are materialised
//! from copies, and every implicit conversion becomes an explicit hidden
//! node the later passes can see.
//!
//! A candidate that fails stays a plain value in the [`MatchState::NoMatch`]
//! state; matching never raises. The overload resolver compares the tallies
//! of the surviving candidates.

use cinder_ast::types::{same_type, TypeFlags};
use cinder_ast::{AstArena, Node, NodeId, NodeKind, Payload, SymFlags, SymId, TypeId, TypeKind};
use cinder_base::Ident;

use crate::ctx::SemCtx;
use crate::diag::DiagKind;
use crate::typerel::{apply_bindings, type_rel, Bindings, Rank};

/// Evaluation state of a candidate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchState {
    /// Not evaluated yet.
    Empty,
    Match,
    NoMatch,
}

/// One overload candidate's match record.
pub struct Candidate {
    pub sym: SymId,
    pub proc_type: TypeId,
    /// Tallies of per-argument ranks; the resolver compares these
    /// lexicographically as `(exact, generic, subtype, conv)`.
    pub exact: u32,
    pub subtype: u32,
    pub generic: u32,
    pub conv: u32,
    pub state: MatchState,
    /// Generic parameter bindings accumulated by this candidate alone.
    pub bindings: Bindings,
    /// Set when an element-typed actual opened an implicit `[x, y, ...]`
    /// container for an open-array or sequence tail parameter.
    pub base_type_match: bool,
    /// The rewritten call, once the candidate matched.
    pub call: NodeId,
    /// The defect that sank this candidate, when one is worth reporting.
    pub failure: Option<DiagKind>,
}

impl Candidate {
    pub fn new(arena: &AstArena, sym: SymId) -> Self {
        Candidate {
            sym,
            proc_type: arena.sym(sym).typ.unwrap_or(TypeId::NIL),
            exact: 0,
            subtype: 0,
            generic: 0,
            conv: 0,
            state: MatchState::Empty,
            bindings: Bindings::new(),
            base_type_match: false,
            call: NodeId::NIL,
            failure: None,
        }
    }

    /// The lexicographic quality key, best tier first.
    pub fn score(&self) -> (u32, u32, u32, u32) {
        (self.exact, self.generic, self.subtype, self.conv)
    }
}

/// Compares two matched candidates by `(exact, generic, subtype, conv)`.
pub fn cmp_candidates(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    a.score().cmp(&b.score())
}

/// Matches `call`'s arguments against `cand`'s formals, leaving the
/// candidate in `Match` (with its rewritten call) or `NoMatch`.
pub fn match_call(ctx: &mut SemCtx, call: NodeId, cand: &mut Candidate) {
    let loc = ctx.arena.node(call).loc;
    if cand.proc_type.is_nil() || ctx.arena.typ(cand.proc_type).kind != TypeKind::Proc {
        cand.state = MatchState::NoMatch;
        return;
    }
    let args = ctx.arena.node(call).sons().to_vec();
    let Some(&callee) = args.first() else {
        cand.state = MatchState::NoMatch;
        cand.failure = Some(DiagKind::InternalError { message: "call node without callee".into() });
        return;
    };

    let proc_ty = ctx.arena.typ(cand.proc_type);
    let formal_types: Vec<TypeId> = proc_ty.sons[1..].to_vec();
    let varargs = proc_ty.flags.contains(TypeFlags::VARARGS);
    let formals_n = proc_ty.n;
    let formal_count = formal_types.len();

    let mut slots: Vec<NodeId> = vec![NodeId::NIL; formal_count];
    let mut bound = vec![false; formal_count];
    let mut tail: Vec<NodeId> = Vec::new();
    let mut container_at: Option<usize> = None;
    let mut container_elems: Vec<NodeId> = Vec::new();
    let mut next_formal = 0usize;

    for &arg in &args[1..] {
        if ctx.arena.node(arg).kind == NodeKind::ExprEqExpr {
            let pair = ctx.arena.node(arg).sons().to_vec();
            let (name_node, value) = match pair.as_slice() {
                &[n, v] => (n, v),
                _ => {
                    cand.state = MatchState::NoMatch;
                    return;
                }
            };
            let ident = if name_node.is_nil() { None } else { ctx.arena.node(name_node).ident() };
            let Some(ident) = ident else {
                cand.failure = Some(DiagKind::NamedParamHasToBeIdent);
                cand.state = MatchState::NoMatch;
                return;
            };
            let Some(i) = formal_index_by_name(ctx, formals_n, ident) else {
                cand.failure = Some(DiagKind::Generated {
                    message: format!("unknown parameter: '{}'", ctx.idents.resolve(ident)),
                });
                cand.state = MatchState::NoMatch;
                return;
            };
            if bound[i] {
                cand.failure = Some(DiagKind::CannotBindTwice {
                    name: ctx.idents.resolve(ident).to_string(),
                });
                cand.state = MatchState::NoMatch;
                return;
            }
            match try_fit(ctx, cand, formal_types[i], value) {
                Some(node) => {
                    slots[i] = node;
                    bound[i] = true;
                }
                None => {
                    cand.state = MatchState::NoMatch;
                    return;
                }
            }
            continue;
        }

        // Positional arguments after an opened container funnel into it.
        if let Some(ci) = container_at {
            let elem = elem_of(&ctx.arena, formal_types[ci]);
            match try_fit(ctx, cand, elem, arg) {
                Some(node) => container_elems.push(node),
                None => {
                    cand.state = MatchState::NoMatch;
                    return;
                }
            }
            continue;
        }

        while next_formal < formal_count && bound[next_formal] {
            next_formal += 1;
        }
        if next_formal >= formal_count {
            if varargs {
                let typed = varargs_arg(ctx, arg);
                tail.push(typed);
                continue;
            }
            cand.failure = Some(DiagKind::Generated { message: "too many arguments".into() });
            cand.state = MatchState::NoMatch;
            return;
        }

        let i = next_formal;
        match try_fit(ctx, cand, formal_types[i], arg) {
            Some(node) => {
                slots[i] = node;
                bound[i] = true;
                next_formal = i + 1;
            }
            None => {
                // Base-type match: an element-typed actual may open an
                // implicit constructor, but only for the last parameter.
                if i + 1 == formal_count && is_collapsible(&ctx.arena, formal_types[i]) {
                    let elem = elem_of(&ctx.arena, formal_types[i]);
                    match try_fit(ctx, cand, elem, arg) {
                        Some(node) => {
                            cand.base_type_match = true;
                            container_at = Some(i);
                            container_elems.push(node);
                            bound[i] = true;
                            continue;
                        }
                        None => {}
                    }
                }
                cand.state = MatchState::NoMatch;
                return;
            }
        }
    }

    if let Some(ci) = container_at {
        let inst = apply_bindings(&mut ctx.arena, &cand.bindings, formal_types[ci]);
        let mut bracket =
            Node::with_payload(NodeKind::Bracket, loc, Payload::Sons(std::mem::take(&mut container_elems)));
        bracket.typ = Some(inst);
        slots[ci] = ctx.arena.add_node(bracket);
    }

    // Fill remaining formals from defaults.
    for (i, slot) in slots.iter_mut().enumerate() {
        if bound[i] {
            continue;
        }
        match formal_default(ctx, formals_n, i) {
            Some(default) => *slot = ctx.arena.copy_tree(default),
            None => {
                cand.failure = Some(DiagKind::Generated {
                    message: format!(
                        "parameter '{}' needs a value",
                        formal_name(ctx, formals_n, i)
                    ),
                });
                cand.state = MatchState::NoMatch;
                return;
            }
        }
    }

    let new_callee = ctx.arena.copy_tree(callee);
    let mut sons = Vec::with_capacity(1 + formal_count + tail.len());
    sons.push(new_callee);
    sons.extend(slots);
    sons.extend(tail);
    let ret = ctx.arena.typ(cand.proc_type).sons[0];
    let ret_inst = if ret.is_nil() {
        None
    } else {
        Some(apply_bindings(&mut ctx.arena, &cand.bindings, ret))
    };
    let mut node = Node::with_payload(NodeKind::Call, loc, Payload::Sons(sons));
    node.typ = ret_inst;
    cand.call = ctx.arena.add_node(node);
    cand.state = MatchState::Match;
}

/// Types one actual against one formal: runs the relation, updates the
/// tallies and returns the converted argument node. `None` means the
/// argument cannot fit this candidate.
fn try_fit(ctx: &mut SemCtx, cand: &mut Candidate, formal: TypeId, arg: NodeId) -> Option<NodeId> {
    if arg.is_nil() || formal.is_nil() {
        return None;
    }
    let Some(atype) = ctx.arena.node(arg).typ else {
        return None;
    };
    let loc = ctx.arena.node(arg).loc;

    // An argument some earlier pass already wrapped is accepted as-is;
    // re-wrapping a hidden conversion would change program meaning.
    if ctx.arena.node(arg).kind.is_hidden_conversion() {
        let inst = apply_bindings(&mut ctx.arena, &cand.bindings, formal);
        if same_type(&ctx.arena, atype, inst) {
            cand.exact += 1;
            return Some(arg);
        }
    }

    let rank = type_rel(&mut ctx.arena, &mut cand.bindings, formal, atype);
    match rank {
        Rank::Equal => {
            cand.exact += 1;
            let copied = ctx.arena.copy_tree(arg);
            // The callee sees an open array as pointer plus length, so the
            // conversion is materialised even on an exact match.
            if ctx.arena.typ(formal).kind == TypeKind::OpenArray {
                let inst = apply_bindings(&mut ctx.arena, &cand.bindings, formal);
                Some(ctx.arena.conv_node(NodeKind::HiddenStdConv, loc, copied, inst))
            } else {
                Some(copied)
            }
        }
        Rank::Subtype => {
            cand.subtype += 1;
            let inst = apply_bindings(&mut ctx.arena, &cand.bindings, formal);
            let copied = ctx.arena.copy_tree(arg);
            Some(ctx.arena.conv_node(NodeKind::HiddenSubConv, loc, copied, inst))
        }
        Rank::Generic => {
            cand.generic += 1;
            let inst = apply_bindings(&mut ctx.arena, &cand.bindings, formal);
            let copied = ctx.arena.copy_tree(arg);
            ctx.arena.node_mut(copied).typ = Some(inst);
            Some(copied)
        }
        Rank::Convertible => {
            cand.conv += 1;
            let inst = apply_bindings(&mut ctx.arena, &cand.bindings, formal);
            let copied = ctx.arena.copy_tree(arg);
            let kind = conv_kind(&ctx.arena, inst, atype);
            Some(ctx.arena.conv_node(kind, loc, copied, inst))
        }
        Rank::None => user_converter(ctx, cand, formal, arg, atype),
    }
}

/// Picks the conversion node kind for a convertible pair; the string and
/// cstring crossings have dedicated kinds the backend lowers specially.
fn conv_kind(arena: &AstArena, formal: TypeId, actual: TypeId) -> NodeKind {
    let (fk, ak) = (arena.typ(formal).kind, arena.typ(actual).kind);
    match (fk, ak) {
        (TypeKind::CString, TypeKind::String) => NodeKind::StringToCString,
        (TypeKind::String, TypeKind::CString) => NodeKind::CStringToString,
        _ => NodeKind::HiddenStdConv,
    }
}

/// Tries the registered user converters: the converter's domain must unify
/// exactly with the actual and its codomain exactly with the formal. A hit
/// wraps the argument in a hidden converter call.
fn user_converter(
    ctx: &mut SemCtx,
    cand: &mut Candidate,
    formal: TypeId,
    arg: NodeId,
    atype: TypeId,
) -> Option<NodeId> {
    let converters = ctx.converters.clone();
    for conv in converters {
        let Some(ct) = ctx.arena.sym(conv).typ else {
            continue;
        };
        if ctx.arena.typ(ct).kind != TypeKind::Proc || ctx.arena.typ(ct).sons.len() != 2 {
            continue;
        }
        let codomain = ctx.arena.typ(ct).sons[0];
        let domain = ctx.arena.typ(ct).sons[1];
        let mut probe = Bindings::new();
        if type_rel(&mut ctx.arena, &mut probe, domain, atype) == Rank::Equal
            && type_rel(&mut ctx.arena, &mut probe, codomain, formal) == Rank::Equal
        {
            cand.conv += 1;
            ctx.arena.sym_mut(conv).flags |= SymFlags::USED;
            let loc = ctx.arena.node(arg).loc;
            let callee = ctx.arena.sym_node(loc, conv);
            let copied = ctx.arena.copy_tree(arg);
            let mut node =
                Node::with_payload(NodeKind::HiddenCallConv, loc, Payload::Sons(vec![callee, copied]));
            node.typ = Some(codomain);
            return Some(ctx.arena.add_node(node));
        }
    }
    None
}

/// Variadic tail arguments pass through verbatim, except that `string`
/// actuals are wrapped for the C-side callee.
fn varargs_arg(ctx: &mut SemCtx, arg: NodeId) -> NodeId {
    let is_string = ctx
        .arena
        .node(arg)
        .typ
        .map(|t| ctx.arena.typ(t).kind == TypeKind::String)
        .unwrap_or(false);
    if is_string {
        let loc = ctx.arena.node(arg).loc;
        let cstring = ctx.basics.cstring;
        let copied = ctx.arena.copy_tree(arg);
        ctx.arena.conv_node(NodeKind::StringToCString, loc, copied, cstring)
    } else {
        arg
    }
}

fn is_collapsible(arena: &AstArena, formal: TypeId) -> bool {
    matches!(arena.typ(formal).kind, TypeKind::OpenArray | TypeKind::Sequence)
}

fn elem_of(arena: &AstArena, t: TypeId) -> TypeId {
    cinder_ast::types::elem_type(arena, t).unwrap_or(TypeId::NIL)
}

fn formal_index_by_name(ctx: &SemCtx, formals_n: Option<NodeId>, ident: Ident) -> Option<usize> {
    let n = formals_n?;
    for (i, &defs) in ctx.arena.node(n).sons().iter().skip(1).enumerate() {
        if defs.is_nil() {
            continue;
        }
        let Some(&sym_node) = ctx.arena.node(defs).sons().first() else {
            continue;
        };
        if sym_node.is_nil() {
            continue;
        }
        if let Some(sym) = ctx.arena.node(sym_node).sym() {
            if ctx.arena.sym(sym).ident == ident {
                return Some(i);
            }
        }
    }
    None
}

fn formal_name(ctx: &SemCtx, formals_n: Option<NodeId>, i: usize) -> String {
    formals_n
        .and_then(|n| ctx.arena.node(n).sons().get(i + 1).copied())
        .filter(|d| !d.is_nil())
        .and_then(|defs| ctx.arena.node(defs).sons().first().copied())
        .filter(|s| !s.is_nil())
        .and_then(|s| ctx.arena.node(s).sym())
        .map(|s| ctx.idents.resolve(ctx.arena.sym(s).ident).to_string())
        .unwrap_or_else(|| format!("#{i}"))
}

fn formal_default(ctx: &SemCtx, formals_n: Option<NodeId>, i: usize) -> Option<NodeId> {
    let n = formals_n?;
    let defs = ctx.arena.node(n).sons().get(i + 1).copied()?;
    if defs.is_nil() {
        return None;
    }
    ctx.arena.node(defs).sons().last().copied().filter(|d| !d.is_nil())
}
