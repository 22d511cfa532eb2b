//! Shared builders for the end-to-end suites.

#![allow(dead_code)]

use cinder_ast::{NodeId, NodeKind, SymId};
use cinder_base::SourceLoc;
use cinder_sema::{match_call, Candidate, SemCtx};

/// Wires the `log` facade into test output; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A call node `name(args...)` with an unresolved identifier callee.
pub fn call(ctx: &mut SemCtx, name: &str, args: &[NodeId]) -> NodeId {
    let ident = ctx.intern(name);
    let callee = ctx.arena.ident_node(SourceLoc::UNKNOWN, ident);
    let mut sons = vec![callee];
    sons.extend_from_slice(args);
    ctx.arena.tree(NodeKind::Call, SourceLoc::UNKNOWN, sons)
}

pub fn int_lit(ctx: &mut SemCtx, value: i64) -> NodeId {
    let t = ctx.basics.int;
    ctx.arena.int_lit(SourceLoc::UNKNOWN, value, Some(t))
}

pub fn float_lit(ctx: &mut SemCtx, value: f64) -> NodeId {
    let t = ctx.basics.float;
    ctx.arena.float_lit(SourceLoc::UNKNOWN, value, Some(t))
}

pub fn str_lit(ctx: &mut SemCtx, value: &str) -> NodeId {
    let t = ctx.basics.string;
    ctx.arena.str_lit(SourceLoc::UNKNOWN, value, Some(t))
}

/// A `name = value` named-argument node.
pub fn named_arg(ctx: &mut SemCtx, name: &str, value: NodeId) -> NodeId {
    let ident = ctx.intern(name);
    let name_node = ctx.arena.ident_node(SourceLoc::UNKNOWN, ident);
    ctx.arena.tree(NodeKind::ExprEqExpr, SourceLoc::UNKNOWN, vec![name_node, value])
}

/// Runs the matcher for one candidate and returns its record.
pub fn candidate_for(ctx: &mut SemCtx, sym: SymId, call_node: NodeId) -> Candidate {
    let mut cand = Candidate::new(&ctx.arena, sym);
    match_call(ctx, call_node, &mut cand);
    cand
}

/// The `(exact, subtype, generic, conv)` tallies of a candidate.
pub fn tally(cand: &Candidate) -> (u32, u32, u32, u32) {
    (cand.exact, cand.subtype, cand.generic, cand.conv)
}

/// The symbol a rewritten call dispatches to.
pub fn winner_of(ctx: &SemCtx, rewritten: NodeId) -> SymId {
    let callee = ctx.arena.node(rewritten).sons()[0];
    ctx.arena.node(callee).sym().expect("rewritten call has a symbol callee")
}
