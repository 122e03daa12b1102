//! Scenario tests against the in-process reference backend.
//!
//! Everything here goes through the public API, which routes every call
//! through the signature-driven marshaling layer.

#![cfg(feature = "stub")]

use basalt::{Basalt, Env, SatResult, Term};
use num_rational::BigRational;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn solver() -> Basalt {
    Basalt::stub()
}

fn fresh_env(basalt: &Basalt) -> Env {
    let config = basalt.config().unwrap();
    basalt.env(&config).unwrap()
}

fn bool_constant<'e>(env: &'e Env, name: &str) -> Term<'e> {
    let ty = env.bool_type().unwrap();
    let decl = env.declare(name, ty).unwrap();
    env.make_constant(decl).unwrap()
}

// ===== End-to-end solving =====

#[test]
fn test_declare_assert_solve_sat() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    env.assert_formula(p).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);

    let model = env.model().unwrap();
    assert!(model.eval(p).unwrap().is_true().unwrap());
}

#[test]
fn test_negation_of_true_is_never_true() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let t = env.make_true().unwrap();
    let nt = env.make_not(t).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);

    let model = env.model().unwrap();
    let value = model.eval(nt).unwrap();
    assert!(value.is_false().unwrap());
    assert!(!value.is_true().unwrap());
}

#[test]
fn test_backtracking_push_pop() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    let np = env.make_not(p).unwrap();

    env.push().unwrap();
    assert_eq!(env.num_backtrack_points().unwrap(), 1);
    env.assert_formula(p).unwrap();
    env.assert_formula(np).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Unsat);

    env.pop().unwrap();
    assert_eq!(env.num_backtrack_points().unwrap(), 0);
    assert_eq!(env.solve().unwrap(), SatResult::Sat);
}

#[test]
fn test_solve_is_idempotent_with_unchanged_assertions() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    env.assert_formula(p).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);
    assert_eq!(env.solve().unwrap(), SatResult::Sat);
}

#[test]
fn test_reset_discards_assertions() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    let np = env.make_not(p).unwrap();
    env.assert_formula(p).unwrap();
    env.assert_formula(np).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Unsat);

    env.reset().unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);
}

#[test]
fn test_asserting_non_boolean_term_fails() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let three = env.make_number("3").unwrap();
    let err = env.assert_formula(three).unwrap_err();
    assert!(err.to_string().contains("basalt_assert"));
}

// ===== Types and declarations =====

#[test]
fn test_zero_parameter_function_type() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let bool_ty = env.bool_type().unwrap();
    let fn_ty = env.function_type(&[], bool_ty).unwrap();
    assert!(fn_ty.is_function().unwrap());
    assert!(!fn_ty.is_bool().unwrap());

    // A 0-ary symbol of that type still yields a boolean constant term.
    let decl = env.declare("flag", fn_ty).unwrap();
    let flag = env.make_constant(decl).unwrap();
    assert!(flag.ty().unwrap().is_bool().unwrap());
    env.assert_formula(flag).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);
}

#[test]
fn test_type_predicates_are_disjoint() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let b = env.bool_type().unwrap();
    let r = env.rational_type().unwrap();
    let i = env.integer_type().unwrap();
    assert!(b.is_bool().unwrap() && !b.is_rational().unwrap() && !b.is_integer().unwrap());
    assert!(r.is_rational().unwrap() && !r.is_bool().unwrap());
    assert!(i.is_integer().unwrap() && !i.is_function().unwrap());
    assert_eq!(b, env.bool_type().unwrap());
}

#[test]
fn test_find_decl_after_declare() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let ty = env.bool_type().unwrap();
    let declared = env.declare("p", ty).unwrap();
    let found = env.find_decl("p").unwrap().expect("declared symbol");
    assert_eq!(declared, found);
    assert_eq!(declared.id().unwrap(), found.id().unwrap());
    assert!(env.find_decl("q").unwrap().is_none());
}

#[test]
fn test_redeclaring_with_other_type_fails() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let bool_ty = env.bool_type().unwrap();
    let int_ty = env.integer_type().unwrap();
    env.declare("x", bool_ty).unwrap();
    let err = env.declare("x", int_ty).unwrap_err();
    assert!(err.to_string().contains("already declared"));
}

// ===== Uninterpreted functions =====

#[test]
fn test_apply_marshals_arguments_in_order() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let int_ty = env.integer_type().unwrap();
    let f_ty = env.function_type(&[int_ty, int_ty], int_ty).unwrap();
    let f = env.declare("f", f_ty).unwrap();

    let one = env.make_number("1").unwrap();
    let two = env.make_number("2").unwrap();
    let app = env.make_apply(f, &[one, two]).unwrap();

    assert!(app.is_apply().unwrap());
    assert_eq!(app.arity().unwrap(), 2);
    assert_eq!(app.arg(0).unwrap(), one);
    assert_eq!(app.arg(1).unwrap(), two);
    assert_eq!(app.decl().unwrap().expect("applied decl"), f);
    assert!(app.arg(2).is_err());
}

#[test]
fn test_apply_wrong_arity_is_native_error() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let int_ty = env.integer_type().unwrap();
    let f_ty = env.function_type(&[int_ty], int_ty).unwrap();
    let f = env.declare("f", f_ty).unwrap();
    let one = env.make_number("1").unwrap();
    assert!(env.make_apply(f, &[one, one]).is_err());
}

// ===== Term construction and introspection =====

#[test]
fn test_structural_sharing_gives_equal_ids() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    let q = bool_constant(&env, "q");
    let a = env.make_and(p, q).unwrap();
    let b = env.make_and(p, q).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.id().unwrap(), b.id().unwrap());
    assert_ne!(a.id().unwrap(), p.id().unwrap());
}

#[test]
fn test_ite_children_in_order() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let c = bool_constant(&env, "c");
    let one = env.make_number("1").unwrap();
    let two = env.make_number("2").unwrap();
    let ite = env.make_ite(c, one, two).unwrap();
    assert!(ite.is_ite().unwrap());
    assert_eq!(ite.arity().unwrap(), 3);
    assert_eq!(ite.arg(0).unwrap(), c);
    assert_eq!(ite.arg(1).unwrap(), one);
    assert_eq!(ite.arg(2).unwrap(), two);
}

#[test]
fn test_shape_predicates_classify_each_shape() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    let q = bool_constant(&env, "q");
    let n = env.make_number("4").unwrap();

    let checks = [
        ("true", env.make_true().unwrap().is_true().unwrap()),
        ("false", env.make_false().unwrap().is_false().unwrap()),
        ("not", env.make_not(p).unwrap().is_not().unwrap()),
        ("and", env.make_and(p, q).unwrap().is_and().unwrap()),
        ("or", env.make_or(p, q).unwrap().is_or().unwrap()),
        ("iff", env.make_iff(p, q).unwrap().is_iff().unwrap()),
        ("equal", env.make_equal(n, n).unwrap().is_equal().unwrap()),
        ("leq", env.make_leq(n, n).unwrap().is_leq().unwrap()),
        ("plus", env.make_plus(n, n).unwrap().is_plus().unwrap()),
        ("times", env.make_times(n, n).unwrap().is_times().unwrap()),
        ("floor", env.make_floor(n).unwrap().is_floor().unwrap()),
        ("number", n.is_number().unwrap()),
        ("constant", p.is_constant().unwrap()),
    ];
    for (shape, classified) in checks {
        assert!(classified, "misclassified {} term", shape);
    }

    assert!(p.is_bool_constant().unwrap());
    assert!(p.is_atom().unwrap());
    assert!(!env.make_and(p, q).unwrap().is_atom().unwrap());
    assert!(env.make_equal(n, n).unwrap().is_atom().unwrap());
}

// ===== Numbers =====

#[test]
fn test_number_round_trips_exactly() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let n = env.make_number("7/9").unwrap();
    assert!(n.is_number().unwrap());
    assert_eq!(n.to_rational().unwrap(), BigRational::new(7.into(), 9.into()));

    let m = env.make_number("-12").unwrap();
    assert_eq!(
        m.to_rational().unwrap(),
        BigRational::from_integer((-12).into())
    );
}

#[test]
fn test_malformed_numeral_is_rejected() {
    let basalt = solver();
    let env = fresh_env(&basalt);
    assert!(env.make_number("abc").is_err());
    assert!(env.make_number("1.5").is_err());
    assert!(env.make_number("3/0").is_err());
}

#[test]
fn test_numeric_extraction_from_non_number_fails() {
    let basalt = solver();
    let env = fresh_env(&basalt);
    let p = bool_constant(&env, "p");
    let err = p.to_rational().unwrap_err();
    assert!(err.to_string().contains("numeric literal"));
}

#[rstest]
#[case("5", true)]
#[case("-5", true)]
#[case("7/9", false)]
#[case("-7/9", false)]
fn test_numeral_type_follows_shape(#[case] text: &str, #[case] integer: bool) {
    let basalt = solver();
    let env = fresh_env(&basalt);
    let n = env.make_number(text).unwrap();
    assert_eq!(n.ty().unwrap().is_integer().unwrap(), integer);
    assert_eq!(n.ty().unwrap().is_rational().unwrap(), !integer);
}

#[test]
fn test_arithmetic_term_types() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let half = env.make_number("1/2").unwrap();
    let two = env.make_number("2").unwrap();
    let sum = env.make_plus(half, two).unwrap();
    assert!(sum.ty().unwrap().is_rational().unwrap());
    let floored = env.make_floor(sum).unwrap();
    assert!(floored.ty().unwrap().is_integer().unwrap());
}

// ===== Parsing and printing =====

#[test]
fn test_print_then_parse_is_identity() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    let q = bool_constant(&env, "q");
    let t = env.make_and(p, env.make_not(q).unwrap()).unwrap();

    let text = t.to_smtlib2().unwrap();
    assert_eq!(text, "(and p (not q))");
    let back = env.parse_smtlib2(&text).unwrap();
    assert_eq!(back, t);
}

#[test]
fn test_parse_native_syntax() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    bool_constant(&env, "p");
    let t = env.parse_term("(or p (<= 1 2))").unwrap();
    assert!(t.is_or().unwrap());
}

#[test]
fn test_parse_undeclared_symbol_reports_detail() {
    let basalt = solver();
    let env = fresh_env(&basalt);
    let err = env.parse_smtlib2("(and mystery true)").unwrap_err();
    assert!(err.to_string().contains("undeclared"), "got: {}", err);
}

// ===== Garbage pass =====

#[test]
fn test_gc_with_keep_set() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    let q = bool_constant(&env, "q");
    env.gc(&[p, q]).unwrap();
    // Zero-length keep-set is a valid empty array, not a null pointer.
    env.gc(&[]).unwrap();
}

// ===== Interpolation =====

#[test]
fn test_interpolant_from_group_partition() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    let np = env.make_not(p).unwrap();

    let a = env.create_itp_group().unwrap();
    let b = env.create_itp_group().unwrap();
    assert_ne!(a, b);

    env.set_itp_group(a).unwrap();
    env.assert_formula(p).unwrap();
    env.set_itp_group(b).unwrap();
    env.assert_formula(np).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Unsat);

    let itp = env.interpolant(&[a]).unwrap();
    assert!(itp.to_smtlib2().unwrap().contains('p'));
}

#[test]
fn test_unknown_itp_group_is_native_error() {
    let basalt = solver();
    let env = fresh_env(&basalt);
    let other_env = fresh_env(&basalt);
    let foreign = other_env.create_itp_group().unwrap();
    drop(other_env);
    // Group ids are env-scoped; an id never created here is rejected.
    assert!(env.set_itp_group(foreign).is_err());
}

// ===== Models =====

#[test]
fn test_model_value_without_explicit_model() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    env.assert_formula(p).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);
    assert!(env.model_value(p).unwrap().is_true().unwrap());
}

#[test]
fn test_model_escape_hatch_round_trip() {
    let basalt = solver();
    let env = fresh_env(&basalt);

    let p = bool_constant(&env, "p");
    env.assert_formula(p).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);

    let raw = env.model().unwrap().into_raw();
    assert!(!raw.is_error());
    let model = unsafe { env.adopt_model(raw) };
    assert!(model.eval(p).unwrap().is_true().unwrap());
}

// ===== Shared environments and cross-env copy =====

#[test]
fn test_copy_term_across_environments() {
    let basalt = solver();
    let config = basalt.config().unwrap();
    let src = basalt.env(&config).unwrap();
    let dst = basalt.shared_env(&config, &src).unwrap();

    let p = bool_constant(&src, "p");
    let q = bool_constant(&src, "q");
    let formula = src.make_and(p, env_not(&src, q)).unwrap();

    let copied = dst.copy_term(formula).unwrap();
    assert!(copied.is_and().unwrap());
    assert_eq!(copied.to_smtlib2().unwrap(), formula.to_smtlib2().unwrap());

    dst.assert_formula(copied).unwrap();
    assert_eq!(dst.solve().unwrap(), SatResult::Sat);
}

fn env_not<'e>(env: &'e Env, t: Term<'e>) -> Term<'e> {
    env.make_not(t).unwrap()
}

// ===== Environment escape hatch =====

#[test]
fn test_env_escape_hatch_round_trip() {
    let basalt = solver();
    let config = basalt.config().unwrap();
    let env = basalt.env(&config).unwrap();
    let raw = env.into_raw();
    assert!(!raw.is_error());

    let env = unsafe { basalt.adopt_env(raw) };
    let t = env.make_true().unwrap();
    env.assert_formula(t).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);
}
