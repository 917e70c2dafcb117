//! Closed forms for a single finite sum whose body is sum-free.

use crate::expr::Expr;
use num_rational::Rational64;
use num_traits::{One, Signed};

/// Highest power of the index that has a Faulhaber formula here.
pub const MAX_POLYNOMIAL_DEGREE: usize = 3;

/// A successful closure of one sum.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSum {
    pub rule: String,
    pub result: Expr,
}

impl ClosedSum {
    fn new(rule: impl Into<String>, result: Expr) -> Self {
        Self {
            rule: rule.into(),
            result,
        }
    }
}

/// Try the closed-form rules in priority order.
pub fn close_sum(body: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Option<ClosedSum> {
    if !body.contains_symbol(var) {
        let count = upper.clone().sub(lower.clone()).add(Expr::one());
        return Some(ClosedSum::new(
            "constant-body",
            body.clone().multiply(count).simplify(),
        ));
    }

    if body.is_symbol(var) {
        let below = lower.clone().sub(Expr::one());
        let result = upper
            .clone()
            .multiply(upper.clone().add(Expr::one()))
            .sub(below.clone().multiply(lower.clone()))
            .divide(Expr::int(2));
        return Some(ClosedSum::new("identity-body", result.simplify()));
    }

    if let Some(coefficients) = poly_coefficients(body, var) {
        let degree = coefficients.len().saturating_sub(1);
        let below = lower.clone().sub(Expr::one());
        let terms: Vec<Expr> = coefficients
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(k, c)| c.multiply(faulhaber(k, upper).sub(faulhaber(k, &below))))
            .collect();
        return Some(ClosedSum::new(
            format!("polynomial-degree-{degree}"),
            Expr::sum_of(terms).simplify(),
        ));
    }

    geometric(body, var, lower, upper)
}

/// Coefficients `[c0, c1, ..]` of `body` as a polynomial in `var`, when it
/// is one of degree at most [`MAX_POLYNOMIAL_DEGREE`].
pub fn poly_coefficients(body: &Expr, var: &str) -> Option<Vec<Expr>> {
    let mut coefficients: Vec<Vec<Expr>> = vec![Vec::new(); MAX_POLYNOMIAL_DEGREE + 1];
    for term in body.simplify().terms() {
        let mut degree = 0usize;
        let mut rest = Vec::new();
        for factor in term.factors() {
            if !factor.contains_symbol(var) {
                rest.push(factor);
                continue;
            }
            match &factor {
                Expr::Symbol(_) => degree += 1,
                Expr::Power(base, exp) if base.is_symbol(var) => {
                    let k = exp.as_integer().filter(|k| *k >= 0)?;
                    degree += usize::try_from(k).ok()?;
                }
                _ => return None,
            }
        }
        if degree > MAX_POLYNOMIAL_DEGREE {
            return None;
        }
        coefficients[degree].push(Expr::product_of(rest));
    }
    let mut out: Vec<Expr> = coefficients
        .into_iter()
        .map(|parts| Expr::sum_of(parts).simplify())
        .collect();
    while out.len() > 1 && out.last().is_some_and(Expr::is_zero) {
        out.pop();
    }
    Some(out)
}

/// `Σ_{v=1}^{x} v^k` for `k ≤ 3`.
pub fn faulhaber(k: usize, x: &Expr) -> Expr {
    let x1 = || x.clone().add(Expr::one());
    match k {
        0 => x.clone(),
        1 => x.clone().multiply(x1()).divide(Expr::int(2)),
        2 => x
            .clone()
            .multiply(x1())
            .multiply(Expr::int(2).multiply(x.clone()).add(Expr::one()))
            .divide(Expr::int(6)),
        _ => x
            .clone()
            .multiply(x1())
            .divide(Expr::int(2))
            .power(Expr::int(2)),
    }
}

/// `c·r^(k·v)` summed over `v`: `c·(ρ^(U+1) − ρ^L)/(ρ − 1)` with `ρ = r^k`.
fn geometric(body: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Option<ClosedSum> {
    let simplified = body.simplify();
    if simplified.terms().len() != 1 {
        return None;
    }
    let mut coefficient = Vec::new();
    let mut ratios = Vec::new();
    for factor in simplified.factors() {
        if !factor.contains_symbol(var) {
            coefficient.push(factor);
            continue;
        }
        let Expr::Power(base, exp) = &factor else {
            return None;
        };
        let r = base.as_rational().filter(|r| r.is_positive() && !r.is_one())?;
        let (slope, rest) = exp.split_coefficient();
        if !rest.is_symbol(var) || !slope.is_integer() {
            return None;
        }
        ratios.push(Expr::constant(r).power(Expr::constant(slope)));
    }
    if ratios.is_empty() {
        return None;
    }
    // 7^i · 4^(-i) sums like (7/4)^i.
    let rho_value = Expr::product_of(ratios).simplify().as_rational()?;
    if rho_value.is_one() {
        return None;
    }
    let rho = Expr::constant(rho_value);
    let top = rho
        .clone()
        .power(upper.clone().add(Expr::one()))
        .sub(rho.power(lower.clone()));
    let result = Expr::product_of(coefficient)
        .multiply(top)
        .divide(Expr::constant(rho_value - Rational64::one()));
    Some(ClosedSum::new("geometric-body", result.simplify()))
}
