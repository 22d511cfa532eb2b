//! End-to-end overload resolution scenarios.
//!
//! Each scenario declares a small overload set, resolves one call site and
//! checks both the winner's identity and the exact per-candidate tallies
//! `(exact, subtype, generic, conv)`, plus the shape of the rewritten call
//! (argument order, materialised defaults and hidden conversions).

mod common;

use cinder_ast::{NodeKind, SymFlags, TypeKind};
use cinder_sema::{resolve_call, DiagKind, MatchState, SemCtx};
use common::*;

// =============================================================================
// The single-proc and two-proc scenarios
// =============================================================================

#[test]
fn exact_match_wins_without_conversion() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let f = ctx.declare_proc("f", &[("x", int)], None).unwrap();

    let arg = int_lit(&mut ctx, 3);
    let call_node = call(&mut ctx, "f", &[arg]);

    let cand = candidate_for(&mut ctx, f, call_node);
    assert_eq!(cand.state, MatchState::Match);
    assert_eq!(tally(&cand), (1, 0, 0, 0));

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    assert_eq!(winner_of(&ctx, rewritten), f);
    // The argument is a fresh copy of the literal, unwrapped.
    let arg_out = ctx.arena.node(rewritten).sons()[1];
    assert_eq!(ctx.arena.node(arg_out).kind, NodeKind::IntLit);
    assert_eq!(ctx.arena.node(arg_out).int_val(), Some(3));
    assert!(ctx.arena.sym(f).flags.contains(SymFlags::USED));
    assert!(ctx.diags.is_empty());
}

#[test]
fn exact_beats_convertible_across_overloads() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let float = ctx.basics.float;
    let f_int = ctx.declare_proc("f", &[("x", int)], None).unwrap();
    let f_float = ctx.declare_proc("f", &[("x", float)], None).unwrap();

    let arg = int_lit(&mut ctx, 3);
    let call_node = call(&mut ctx, "f", &[arg]);

    let c_int = candidate_for(&mut ctx, f_int, call_node);
    let c_float = candidate_for(&mut ctx, f_float, call_node);
    assert_eq!(tally(&c_int), (1, 0, 0, 0));
    assert_eq!(tally(&c_float), (0, 0, 0, 1));

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    assert_eq!(winner_of(&ctx, rewritten), f_int);
    assert!(ctx.diags.is_empty());
}

#[test]
fn lone_float_overload_wraps_the_int_argument() {
    init_logging();
    let mut ctx = SemCtx::new();
    let float = ctx.basics.float;
    let f = ctx.declare_proc("f", &[("x", float)], None).unwrap();

    let arg = int_lit(&mut ctx, 3);
    let call_node = call(&mut ctx, "f", &[arg]);

    let cand = candidate_for(&mut ctx, f, call_node);
    assert_eq!(tally(&cand), (0, 0, 0, 1));

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    assert_eq!(winner_of(&ctx, rewritten), f);
    let arg_out = ctx.arena.node(rewritten).sons()[1];
    assert_eq!(ctx.arena.node(arg_out).kind, NodeKind::HiddenStdConv);
    assert_eq!(ctx.arena.node(arg_out).typ, Some(float));
    let inner = ctx.arena.node(arg_out).sons()[0];
    assert_eq!(ctx.arena.node(inner).int_val(), Some(3));
}

#[test]
fn generic_parameter_refuses_rebinding() {
    // proc f[T](x: T, y: T) called with (1, 2.0): T is bound to int by the
    // first argument; the second cannot rebind it, so nothing matches.
    init_logging();
    let mut ctx = SemCtx::new();
    let t = ctx.generic_param("T");
    let x = ctx.intern("x");
    let y = ctx.intern("y");
    let pt = ctx.proc_type(&[(x, t), (y, t)], None);
    let ident = ctx.intern("f");
    let mut sym = cinder_ast::Symbol::new(cinder_ast::SymKind::Proc, ident);
    sym.typ = Some(pt);
    let f = ctx.declare(sym).unwrap();

    let a = int_lit(&mut ctx, 1);
    let b = float_lit(&mut ctx, 2.0);
    let call_node = call(&mut ctx, "f", &[a, b]);

    let cand = candidate_for(&mut ctx, f, call_node);
    assert_eq!(cand.state, MatchState::NoMatch);
    // The first argument got as far as binding T.
    assert_eq!(cand.generic, 1);
    assert_eq!(cand.bindings.get(t.id()).copied(), Some(ctx.basics.int));

    assert!(resolve_call(&mut ctx, call_node).is_none());
    assert!(ctx
        .diags
        .iter()
        .any(|d| matches!(d.kind, DiagKind::TypeMismatch { .. })));
}

#[test]
fn exact_beats_subtype_for_a_platform_int_actual() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let int32 = ctx.basics.int32;
    let f_int = ctx.declare_proc("f", &[("x", int)], None).unwrap();
    let f_int32 = ctx.declare_proc("f", &[("x", int32)], None).unwrap();

    let arg = int_lit(&mut ctx, 3);
    let call_node = call(&mut ctx, "f", &[arg]);

    let c_int = candidate_for(&mut ctx, f_int, call_node);
    let c_int32 = candidate_for(&mut ctx, f_int32, call_node);
    assert_eq!(tally(&c_int), (1, 0, 0, 0));
    assert_eq!(tally(&c_int32), (0, 1, 0, 0));

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    assert_eq!(winner_of(&ctx, rewritten), f_int);
}

#[test]
fn open_array_collapses_trailing_actuals_into_a_bracket() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let oa = ctx.arena.new_type_with(TypeKind::OpenArray, vec![int]);
    let g = ctx.declare_proc("g", &[("xs", oa)], None).unwrap();

    let a = int_lit(&mut ctx, 1);
    let b = int_lit(&mut ctx, 2);
    let c = int_lit(&mut ctx, 3);
    let call_node = call(&mut ctx, "g", &[a, b, c]);

    let cand = candidate_for(&mut ctx, g, call_node);
    assert_eq!(cand.state, MatchState::Match);
    assert!(cand.base_type_match);

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    let sons = ctx.arena.node(rewritten).sons().to_vec();
    assert_eq!(sons.len(), 2, "callee plus a single collapsed argument");
    let bracket = sons[1];
    assert_eq!(ctx.arena.node(bracket).kind, NodeKind::Bracket);
    assert_eq!(ctx.arena.node(bracket).len(), 3);
    let bt = ctx.arena.node(bracket).typ.expect("bracket is typed");
    assert_eq!(ctx.arena.typ(bt).kind, TypeKind::OpenArray);
    let values: Vec<i64> = ctx
        .arena
        .node(bracket)
        .sons()
        .iter()
        .map(|&e| ctx.arena.node(e).int_val().unwrap())
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
}

// =============================================================================
// Named arguments, defaults, varargs
// =============================================================================

#[test]
fn named_arguments_land_in_formal_order() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let f = ctx.declare_proc("f", &[("a", int), ("b", int)], None).unwrap();

    let one = int_lit(&mut ctx, 1);
    let two = int_lit(&mut ctx, 2);
    let arg_b = named_arg(&mut ctx, "b", two);
    let arg_a = named_arg(&mut ctx, "a", one);
    let call_node = call(&mut ctx, "f", &[arg_b, arg_a]);

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    assert_eq!(winner_of(&ctx, rewritten), f);
    let sons = ctx.arena.node(rewritten).sons().to_vec();
    assert_eq!(ctx.arena.node(sons[1]).int_val(), Some(1));
    assert_eq!(ctx.arena.node(sons[2]).int_val(), Some(2));
}

#[test]
fn binding_a_parameter_twice_is_diagnosed() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    ctx.declare_proc("f", &[("x", int)], None).unwrap();

    let one = int_lit(&mut ctx, 1);
    let two = int_lit(&mut ctx, 2);
    let first = named_arg(&mut ctx, "x", one);
    let second = named_arg(&mut ctx, "x", two);
    let call_node = call(&mut ctx, "f", &[first, second]);

    assert!(resolve_call(&mut ctx, call_node).is_none());
    assert!(ctx
        .diags
        .iter()
        .any(|d| matches!(&d.kind, DiagKind::CannotBindTwice { name } if name == "x")));
}

#[test]
fn named_parameter_must_be_an_identifier() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    ctx.declare_proc("f", &[("x", int)], None).unwrap();

    let one = int_lit(&mut ctx, 1);
    let two = int_lit(&mut ctx, 2);
    let bogus = ctx
        .arena
        .tree(NodeKind::ExprEqExpr, cinder_base::SourceLoc::UNKNOWN, vec![one, two]);
    let call_node = call(&mut ctx, "f", &[bogus]);

    assert!(resolve_call(&mut ctx, call_node).is_none());
    assert!(ctx
        .diags
        .iter()
        .any(|d| matches!(d.kind, DiagKind::NamedParamHasToBeIdent)));
}

#[test]
fn missing_argument_takes_the_default() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let f = ctx.declare_proc("f", &[("x", int), ("y", int)], None).unwrap();
    let ptype = ctx.arena.sym(f).typ.unwrap();
    let seven = int_lit(&mut ctx, 7);
    ctx.set_param_default(ptype, 1, seven);

    let one = int_lit(&mut ctx, 1);
    let call_node = call(&mut ctx, "f", &[one]);

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    let sons = ctx.arena.node(rewritten).sons().to_vec();
    assert_eq!(sons.len(), 3);
    assert_eq!(ctx.arena.node(sons[2]).int_val(), Some(7));
    // The default was copied, not shared.
    assert_ne!(sons[2], seven);
}

#[test]
fn missing_argument_without_default_fails() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let f = ctx.declare_proc("f", &[("x", int), ("y", int)], None).unwrap();

    let one = int_lit(&mut ctx, 1);
    let call_node = call(&mut ctx, "f", &[one]);

    let cand = candidate_for(&mut ctx, f, call_node);
    assert_eq!(cand.state, MatchState::NoMatch);
    assert!(resolve_call(&mut ctx, call_node).is_none());
    assert!(ctx.diags.has_errors());
}

#[test]
fn varargs_tail_wraps_string_actuals_as_cstring() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let f = ctx
        .declare_routine(
            cinder_ast::SymKind::Proc,
            "emit",
            &[("x", int)],
            None,
            cinder_ast::TypeFlags::VARARGS,
        )
        .unwrap();

    let one = int_lit(&mut ctx, 1);
    let s = str_lit(&mut ctx, "tag");
    let two = int_lit(&mut ctx, 2);
    let call_node = call(&mut ctx, "emit", &[one, s, two]);

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    assert_eq!(winner_of(&ctx, rewritten), f);
    let sons = ctx.arena.node(rewritten).sons().to_vec();
    assert_eq!(sons.len(), 4);
    assert_eq!(ctx.arena.node(sons[2]).kind, NodeKind::StringToCString);
    assert_eq!(
        ctx.arena.node(sons[2]).typ.map(|t| ctx.arena.typ(t).kind),
        Some(TypeKind::CString)
    );
    assert_eq!(ctx.arena.node(sons[3]).int_val(), Some(2));
}

// =============================================================================
// User converters
// =============================================================================

#[test]
fn user_converter_rescues_a_failed_relation() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let string = ctx.basics.string;
    let conv = ctx.declare_converter("toInt", string, int).unwrap();
    let f = ctx.declare_proc("f", &[("x", int)], None).unwrap();

    let s = str_lit(&mut ctx, "12");
    let call_node = call(&mut ctx, "f", &[s]);

    let cand = candidate_for(&mut ctx, f, call_node);
    assert_eq!(cand.state, MatchState::Match);
    assert_eq!(tally(&cand), (0, 0, 0, 1));

    let rewritten = resolve_call(&mut ctx, call_node).expect("unique winner");
    let arg_out = ctx.arena.node(rewritten).sons()[1];
    assert_eq!(ctx.arena.node(arg_out).kind, NodeKind::HiddenCallConv);
    let conv_callee = ctx.arena.node(arg_out).sons()[0];
    assert_eq!(ctx.arena.node(conv_callee).sym(), Some(conv));
    assert!(ctx.arena.sym(conv).flags.contains(SymFlags::USED));
}

// =============================================================================
// Ambiguity, empty sets, undeclared names
// =============================================================================

#[test]
fn identical_scores_are_ambiguous() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    ctx.declare_proc("f", &[("x", int)], None).unwrap();
    ctx.declare_proc("f", &[("y", int)], None).unwrap();

    let arg = int_lit(&mut ctx, 3);
    let call_node = call(&mut ctx, "f", &[arg]);

    assert!(resolve_call(&mut ctx, call_node).is_none());
    let amb = ctx
        .diags
        .iter()
        .find(|d| matches!(d.kind, DiagKind::AmbiguousCall { .. }))
        .expect("ambiguity diagnostic");
    if let DiagKind::AmbiguousCall { first, second } = &amb.kind {
        assert!(first.contains("proc f"));
        assert!(second.contains("proc f"));
        assert_ne!(first, second);
    }
}

#[test]
fn undeclared_callee_is_diagnosed() {
    init_logging();
    let mut ctx = SemCtx::new();
    let arg = int_lit(&mut ctx, 1);
    let call_node = call(&mut ctx, "frobnicate", &[arg]);
    assert!(resolve_call(&mut ctx, call_node).is_none());
    assert!(ctx
        .diags
        .iter()
        .any(|d| matches!(&d.kind, DiagKind::UndeclaredIdentifier { name } if name == "frobnicate")));
}

#[test]
fn non_callable_name_is_left_to_downstream() {
    init_logging();
    let mut ctx = SemCtx::new();
    let int = ctx.basics.int;
    let x = ctx.intern("x");
    let mut sym = cinder_ast::Symbol::new(cinder_ast::SymKind::Var, x);
    sym.typ = Some(int);
    ctx.declare(sym).unwrap();

    let arg = int_lit(&mut ctx, 1);
    let call_node = call(&mut ctx, "x", &[arg]);
    // No winner, but no diagnostic either: a later pass may find a call
    // operator for the value.
    assert!(resolve_call(&mut ctx, call_node).is_none());
    assert!(ctx.diags.is_empty());
}

// =============================================================================
// Generic instantiation
// =============================================================================

#[test]
fn generic_winner_is_instantiated_and_cached() {
    init_logging();
    let mut ctx = SemCtx::new();
    let t = ctx.generic_param("T");
    let x = ctx.intern("x");
    let pt = ctx.proc_type(&[(x, t)], Some(t));
    let ident = ctx.intern("id");
    let mut sym = cinder_ast::Symbol::new(cinder_ast::SymKind::Proc, ident);
    sym.typ = Some(pt);
    let generic = ctx.declare(sym).unwrap();

    let a = int_lit(&mut ctx, 3);
    let first_call = call(&mut ctx, "id", &[a]);
    let rewritten = resolve_call(&mut ctx, first_call).expect("winner");

    let inst = winner_of(&ctx, rewritten);
    assert_ne!(inst, generic);
    assert!(ctx.arena.sym(inst).flags.contains(SymFlags::FROM_INSTANTIATION));
    // The instance signature and the call type are concrete.
    let inst_ty = ctx.arena.sym(inst).typ.unwrap();
    assert_eq!(ctx.arena.typ(ctx.arena.typ(inst_ty).sons[0]).kind, TypeKind::Int);
    assert_eq!(
        ctx.arena.node(rewritten).typ.map(|t| ctx.arena.typ(t).kind),
        Some(TypeKind::Int)
    );

    // A second call with the same binding reuses the cached instance.
    let b = int_lit(&mut ctx, 9);
    let second_call = call(&mut ctx, "id", &[b]);
    let rewritten2 = resolve_call(&mut ctx, second_call).expect("winner");
    assert_eq!(winner_of(&ctx, rewritten2), inst);

    // A different binding yields a different instance.
    let c = float_lit(&mut ctx, 1.0);
    let third_call = call(&mut ctx, "id", &[c]);
    let rewritten3 = resolve_call(&mut ctx, third_call).expect("winner");
    assert_ne!(winner_of(&ctx, rewritten3), inst);
}

// =============================================================================
// Determinism and idempotence
// =============================================================================

#[test]
fn resolution_is_deterministic_across_runs() {
    init_logging();
    let run = || {
        let mut ctx = SemCtx::new();
        let int = ctx.basics.int;
        let float = ctx.basics.float;
        ctx.declare_proc("f", &[("x", float)], None).unwrap();
        let f_int = ctx.declare_proc("f", &[("x", int)], None).unwrap();
        let arg = int_lit(&mut ctx, 3);
        let call_node = call(&mut ctx, "f", &[arg]);
        let rewritten = resolve_call(&mut ctx, call_node).expect("winner");
        let winner = winner_of(&ctx, rewritten);
        let shape: Vec<NodeKind> = ctx
            .arena
            .node(rewritten)
            .sons()
            .iter()
            .map(|&s| ctx.arena.node(s).kind)
            .collect();
        (winner == f_int, shape)
    };
    assert_eq!(run(), run());
}

#[test]
fn rewritten_calls_are_not_rewrapped() {
    init_logging();
    let mut ctx = SemCtx::new();
    let float = ctx.basics.float;
    ctx.declare_proc("f", &[("x", float)], None).unwrap();

    let arg = int_lit(&mut ctx, 3);
    let call_node = call(&mut ctx, "f", &[arg]);
    let first = resolve_call(&mut ctx, call_node).expect("winner");
    let first_arg = ctx.arena.node(first).sons()[1];
    assert_eq!(ctx.arena.node(first_arg).kind, NodeKind::HiddenStdConv);

    // Resolving the already-rewritten call accepts the wrapped argument
    // as an exact match and does not nest another conversion.
    let second = resolve_call(&mut ctx, first).expect("winner again");
    let second_arg = ctx.arena.node(second).sons()[1];
    assert_eq!(second_arg, first_arg, "argument reused as-is");
    let inner = ctx.arena.node(second_arg).sons()[0];
    assert_eq!(ctx.arena.node(inner).kind, NodeKind::IntLit);
}
