//! Property-based tests for simplification and summation closure.

use costmap::{Expr, SummationEngine};
use proptest::prelude::*;
use std::collections::HashMap;

fn env(n: i64, m: i64) -> HashMap<String, f64> {
    HashMap::from([("n".to_string(), n as f64), ("m".to_string(), m as f64)])
}

fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

/// Small polynomial expressions over `n` and `m`.
fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (-3i64..=3).prop_map(Expr::int),
        Just(Expr::sym("n")),
        Just(Expr::sym("m")),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(Expr::sum_of),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.multiply(b)),
            (inner.clone(), 0i64..=2).prop_map(|(a, k)| a.power(Expr::int(k))),
            inner.prop_map(Expr::negate),
        ]
    })
}

proptest! {
    #[test]
    fn simplify_preserves_value(expr in arb_expr(), n in 1i64..5, m in 1i64..5) {
        let env = env(n, m);
        let before = expr.eval(&env);
        let after = expr.simplify().eval(&env);
        match (before, after) {
            (Some(a), Some(b)) => prop_assert!(close_enough(a, b), "{expr}: {a} vs {b}"),
            (a, b) => prop_assert_eq!(a.is_some(), b.is_some()),
        }
    }

    #[test]
    fn simplify_is_idempotent(expr in arb_expr()) {
        let once = expr.simplify();
        prop_assert_eq!(once.simplify(), once);
    }

    #[test]
    fn power_sums_close_to_the_right_value(k in 0i64..=3, n in 1i64..30) {
        let i = Expr::sym("i");
        let sum = Expr::finite_sum(i.power(Expr::int(k)), "i", Expr::one(), Expr::sym("n"));
        let closure = SummationEngine::default().close(&sum);
        prop_assert!(closure.complete);
        prop_assert!(!closure.expr.contains_finite_sum());
        let env = env(n, 1);
        let direct: f64 = (1..=n).map(|i| (i as f64).powi(k as i32)).sum();
        let closed = closure.expr.eval(&env).unwrap_or(f64::NAN);
        prop_assert!(close_enough(direct, closed), "k = {k}, n = {n}: {direct} vs {closed}");
    }

    #[test]
    fn shifted_bounds_close_correctly(lo in 0i64..5, n in 5i64..25) {
        let sum = Expr::finite_sum(Expr::sym("j"), "j", Expr::int(lo), Expr::sym("n"));
        let closure = SummationEngine::default().close(&sum);
        prop_assert!(closure.complete);
        let direct: f64 = (lo..=n).map(|j| j as f64).sum();
        let closed = closure.expr.eval(&env(n, 1)).unwrap_or(f64::NAN);
        prop_assert!(close_enough(direct, closed));
    }
}

#[test]
fn triangular_nest_closes_to_n_squared_over_two() {
    let inner = Expr::finite_sum(Expr::one(), "j", Expr::one(), Expr::sym("i"));
    let outer = Expr::finite_sum(inner, "i", Expr::one(), Expr::sym("n"));
    let closure = SummationEngine::default().close(&outer);
    assert!(closure.complete);
    assert_eq!(closure.expr.to_string(), "n^2/2 + n/2");
    assert_eq!(closure.steps.len(), 2);
}

#[test]
fn cube_sum_is_the_squared_triangular_number() {
    let i = Expr::sym("i");
    let sum = Expr::finite_sum(i.power(Expr::int(3)), "i", Expr::one(), Expr::sym("n"));
    let closure = SummationEngine::default().close(&sum);
    assert!(closure.complete);
    let n = Expr::sym("n");
    let triangular = n.clone().multiply(n.add(Expr::one())).divide(Expr::int(2));
    assert_eq!(closure.expr, triangular.power(Expr::int(2)).simplify());
    for n in 1..=20i64 {
        let t = n * (n + 1) / 2;
        assert_eq!(closure.expr.eval(&env(n, 1)), Some((t * t) as f64), "n = {n}");
    }
}

#[test]
fn counting_sum_closes_to_its_upper_bound() {
    let sum = Expr::finite_sum(Expr::one(), "i", Expr::one(), Expr::sym("n"));
    assert_eq!(SummationEngine::default().close(&sum).expr, Expr::sym("n"));
}

#[test]
fn identity_sum_matches_gauss_for_small_n() {
    let sum = Expr::finite_sum(Expr::sym("i"), "i", Expr::one(), Expr::sym("n"));
    let closed = SummationEngine::default().close(&sum).expr;
    for n in 1..=50i64 {
        let value = closed.eval(&env(n, 1));
        assert_eq!(value, Some((n * (n + 1) / 2) as f64), "n = {n}");
    }
}

#[test]
fn rectangular_nest_is_a_product() {
    let inner = Expr::finite_sum(Expr::one(), "j", Expr::one(), Expr::sym("m"));
    let outer = Expr::finite_sum(inner, "i", Expr::one(), Expr::sym("n"));
    let closure = SummationEngine::default().close(&outer);
    assert!(closure.complete);
    assert_eq!(
        closure.expr,
        Expr::sym("n").multiply(Expr::sym("m")).simplify()
    );
}
