//! Local normalization of expressions.
//!
//! One pass folds constants, flattens nested sums and products, collects
//! like terms, merges powers of a common base, distributes products over
//! sums and applies the logarithm identities that hold for positive sizes.
//! [`Expr::simplify`] repeats passes until nothing changes, so the result is
//! a fixed point and simplifying it again returns it unchanged.

use super::Expr;
use num_rational::Rational64;
use num_traits::{CheckedAdd, CheckedMul, One, Signed, Zero};
use std::collections::BTreeMap;

/// Maximum number of normalization passes before giving up on a fixed point.
pub const DEFAULT_SIMPLIFY_BUDGET: usize = 16;

/// Integer powers of sums up to this exponent are expanded.
const MAX_EXPANDED_POWER: i64 = 8;

/// Larger exponents are left symbolic instead of folded.
const MAX_FOLDED_EXPONENT: i64 = 62;

impl Expr {
    /// Normalize the expression to its canonical form.
    pub fn simplify(&self) -> Expr {
        self.simplify_with_budget(DEFAULT_SIMPLIFY_BUDGET)
    }

    /// Normalize with an explicit pass budget.
    ///
    /// If the budget runs out the best partial result is returned.
    pub fn simplify_with_budget(&self, budget: usize) -> Expr {
        let mut current = self.clone();
        for _ in 0..budget.max(1) {
            let next = simplify_pass(&current);
            if next == current {
                return next;
            }
            current = next;
        }
        log::debug!("simplify budget of {} passes exhausted", budget);
        current
    }
}

fn simplify_pass(expr: &Expr) -> Expr {
    match expr {
        Expr::Int(_) | Expr::Symbol(_) => expr.clone(),
        Expr::Rational(r) => Expr::constant(*r),
        Expr::Sum(terms) => simplify_sum(terms.iter().map(simplify_pass).collect()),
        Expr::Product(factors) => simplify_product(factors.iter().map(simplify_pass).collect()),
        Expr::Power(base, exp) => simplify_power(simplify_pass(base), simplify_pass(exp)),
        Expr::Log(arg) => simplify_log(simplify_pass(arg)),
        Expr::FiniteSum {
            body,
            var,
            lower,
            upper,
        } => Expr::FiniteSum {
            body: Box::new(simplify_pass(body)),
            var: var.clone(),
            lower: Box::new(simplify_pass(lower)),
            upper: Box::new(simplify_pass(upper)),
        },
    }
}

fn flatten_into(expr: Expr, is_sum: bool, out: &mut Vec<Expr>) {
    match expr {
        Expr::Sum(items) if is_sum => items.into_iter().for_each(|e| flatten_into(e, true, out)),
        Expr::Product(items) if !is_sum => {
            items.into_iter().for_each(|e| flatten_into(e, false, out))
        }
        other => out.push(other),
    }
}

pub(super) fn simplify_sum(terms: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(terms.len());
    terms
        .into_iter()
        .for_each(|t| flatten_into(t, true, &mut flat));

    let mut constant = Rational64::zero();
    let mut like_terms: BTreeMap<Expr, Rational64> = BTreeMap::new();
    let mut unfolded = Vec::new();

    for term in flat {
        if let Some(value) = term.as_rational() {
            match constant.checked_add(&value) {
                Some(total) => constant = total,
                None => unfolded.push(term),
            }
            continue;
        }
        let (coefficient, key) = term.split_coefficient();
        let entry = like_terms.entry(key).or_insert_with(Rational64::zero);
        match entry.checked_add(&coefficient) {
            Some(total) => *entry = total,
            None => unfolded.push(term),
        }
    }

    let mut out: Vec<Expr> = like_terms
        .into_iter()
        .filter(|(_, coefficient)| !coefficient.is_zero())
        .map(|(key, coefficient)| scale(coefficient, key))
        .collect();
    out.extend(unfolded);
    if !constant.is_zero() {
        out.push(Expr::constant(constant));
    }
    Expr::sum_of(out)
}

fn scale(coefficient: Rational64, key: Expr) -> Expr {
    if coefficient.is_one() {
        return key;
    }
    match key {
        Expr::Product(mut factors) => {
            factors.insert(0, Expr::constant(coefficient));
            Expr::Product(factors)
        }
        other => Expr::Product(vec![Expr::constant(coefficient), other]),
    }
}

pub(super) fn simplify_product(factors: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(factors.len());
    factors
        .into_iter()
        .for_each(|f| flatten_into(f, false, &mut flat));

    let mut coefficient = Rational64::one();
    let mut unfolded_constants = Vec::new();
    let mut bases: BTreeMap<Expr, Vec<Expr>> = BTreeMap::new();

    for factor in flat {
        if let Some(value) = factor.as_rational() {
            if value.is_zero() {
                return Expr::zero();
            }
            match coefficient.checked_mul(&value) {
                Some(product) => coefficient = product,
                None => unfolded_constants.push(factor),
            }
            continue;
        }
        let (base, exponent) = match factor {
            Expr::Power(base, exponent) => (*base, *exponent),
            other => (other, Expr::one()),
        };
        bases.entry(base).or_default().push(exponent);
    }

    let mut rest = Vec::with_capacity(bases.len());
    for (base, exponents) in bases {
        let merged = exponents.len() > 1;
        let exponent = if merged {
            simplify_sum(exponents)
        } else {
            exponents.into_iter().next().unwrap_or_else(Expr::one)
        };
        if exponent.is_zero() {
            continue;
        }
        let factor = if merged {
            simplify_power(base, exponent)
        } else if exponent.is_one() {
            base
        } else {
            Expr::Power(Box::new(base), Box::new(exponent))
        };
        match factor.as_rational() {
            Some(value) => match coefficient.checked_mul(&value) {
                Some(product) => coefficient = product,
                None => rest.push(factor),
            },
            None => rest.push(factor),
        }
    }

    if coefficient.is_zero() {
        return Expr::zero();
    }

    // Distribute over the first sum so that polynomials end up expanded.
    if let Some(position) = rest.iter().position(|f| matches!(f, Expr::Sum(_))) {
        if rest.len() > 1 || !coefficient.is_one() || !unfolded_constants.is_empty() {
            let sum = rest.remove(position);
            let mut others = unfolded_constants;
            others.push(Expr::constant(coefficient));
            others.extend(rest);
            let distributed = sum
                .terms()
                .into_iter()
                .map(|term| {
                    let mut product = others.clone();
                    product.push(term);
                    simplify_product(product)
                })
                .collect();
            return simplify_sum(distributed);
        }
    }

    let mut out = Vec::with_capacity(rest.len() + 1);
    if !coefficient.is_one() {
        out.push(Expr::constant(coefficient));
    }
    out.extend(unfolded_constants);
    out.extend(rest);
    Expr::product_of(out)
}

fn rational_pow(base: Rational64, exponent: i64) -> Option<Rational64> {
    if exponent.abs() > MAX_FOLDED_EXPONENT || (exponent < 0 && base.is_zero()) {
        return None;
    }
    let mut result = Rational64::one();
    for _ in 0..exponent.abs() {
        result = result.checked_mul(&base)?;
    }
    Some(if exponent < 0 { result.recip() } else { result })
}

/// `coefficient · Log(arg)` decomposition of an exponent, when `arg` is symbolic.
fn log_factor(exponent: &Expr) -> Option<(Expr, Expr)> {
    match exponent {
        Expr::Log(arg) if !arg.free_symbols().is_empty() => Some((Expr::one(), *arg.clone())),
        Expr::Product(factors) => {
            let position = factors.iter().position(
                |f| matches!(f, Expr::Log(arg) if !arg.free_symbols().is_empty()),
            )?;
            let mut rest = factors.clone();
            let log = rest.remove(position);
            match log {
                Expr::Log(arg) => Some((Expr::product_of(rest), *arg)),
                _ => None,
            }
        }
        _ => None,
    }
}

pub(super) fn simplify_power(base: Expr, exponent: Expr) -> Expr {
    if exponent.is_zero() {
        return Expr::one();
    }
    if exponent.is_one() {
        return base;
    }
    if base.is_one() {
        return Expr::one();
    }
    if let Some(value) = base.as_rational() {
        if let Some(k) = exponent.as_integer() {
            return match rational_pow(value, k) {
                Some(result) => Expr::constant(result),
                None => Expr::Power(Box::new(base), Box::new(exponent)),
            };
        }
        if value.is_zero() && exponent.as_rational().is_some_and(|e| e.is_positive()) {
            return Expr::zero();
        }
        if value.is_positive() {
            // c^(a + b) = c^a · c^b keeps exponents of constant bases atomic.
            if let Expr::Sum(terms) = &exponent {
                return simplify_product(
                    terms
                        .iter()
                        .map(|t| simplify_power(base.clone(), t.clone()))
                        .collect(),
                );
            }
            // c^(k·log x) = x^(k·log c)
            if let Some((coefficient, arg)) = log_factor(&exponent) {
                let new_exponent = simplify_product(vec![coefficient, simplify_log(base)]);
                return simplify_power(arg, new_exponent);
            }
        }
        return Expr::Power(Box::new(base), Box::new(exponent));
    }

    match (base, exponent.as_integer()) {
        (Expr::Power(inner_base, inner_exponent), Some(k)) => {
            let combined = simplify_product(vec![*inner_exponent, Expr::Int(k)]);
            simplify_power(*inner_base, combined)
        }
        (Expr::Product(factors), Some(k)) => simplify_product(
            factors
                .into_iter()
                .map(|f| simplify_power(f, Expr::Int(k)))
                .collect(),
        ),
        (Expr::Sum(terms), Some(k)) if (2..=MAX_EXPANDED_POWER).contains(&k) => {
            expand_power(&terms, k)
        }
        (base, _) => Expr::Power(Box::new(base), Box::new(exponent)),
    }
}

/// Multiply out `(t₁ + … + tₘ)^k` one factor at a time.
///
/// Each step multiplies single terms, which are never sums, so the base
/// is not handed back to [`simplify_product`] where it would merge into
/// the same power again.
fn expand_power(terms: &[Expr], k: i64) -> Expr {
    let mut expanded = vec![Expr::one()];
    for _ in 0..k {
        let next = expanded
            .iter()
            .flat_map(|left| {
                terms
                    .iter()
                    .map(move |right| simplify_product(vec![left.clone(), right.clone()]))
            })
            .collect();
        expanded = simplify_sum(next).terms();
    }
    simplify_sum(expanded)
}

/// Split `value` into `2^k · odd`.
fn split_power_of_two(mut value: i64) -> (i64, i64) {
    let mut k = 0;
    while value != 0 && value % 2 == 0 {
        value /= 2;
        k += 1;
    }
    (k, value)
}

pub(super) fn simplify_log(arg: Expr) -> Expr {
    if let Some(value) = arg.as_rational() {
        if !value.is_positive() {
            return Expr::Log(Box::new(arg));
        }
        if value.is_one() {
            return Expr::zero();
        }
        let (numer_twos, numer_odd) = split_power_of_two(*value.numer());
        let (denom_twos, denom_odd) = split_power_of_two(*value.denom());
        if numer_twos == 0 && denom_twos == 0 && *value.denom() == 1 {
            return Expr::Log(Box::new(arg));
        }
        let mut terms = Vec::new();
        if numer_twos != denom_twos {
            terms.push(Expr::Int(numer_twos - denom_twos));
        }
        if numer_odd > 1 {
            terms.push(Expr::Log(Box::new(Expr::Int(numer_odd))));
        }
        if denom_odd > 1 {
            terms.push(Expr::Product(vec![
                Expr::Int(-1),
                Expr::Log(Box::new(Expr::Int(denom_odd))),
            ]));
        }
        return simplify_sum(terms);
    }

    match arg {
        Expr::Power(base, exponent) => simplify_product(vec![*exponent, simplify_log(*base)]),
        Expr::Product(factors)
            if factors
                .iter()
                .all(|f| f.as_rational().map_or(true, |r| r.is_positive())) =>
        {
            simplify_sum(factors.into_iter().map(simplify_log).collect())
        }
        other => Expr::Log(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn n() -> Expr {
        Expr::sym("n")
    }

    #[test]
    fn collects_like_terms_and_drops_zero() {
        let expr = n().add(n()).add(Expr::int(3)).sub(Expr::int(3));
        assert_eq!(expr.simplify(), Expr::Product(vec![Expr::Int(2), n()]));
    }

    #[test]
    fn expands_triangular_number() {
        let expr = n().multiply(n().add(Expr::one())).divide(Expr::int(2));
        let expected = Expr::Sum(vec![
            Expr::Product(vec![Expr::rational(1, 2), n()]),
            Expr::Product(vec![
                Expr::rational(1, 2),
                Expr::Power(Box::new(n()), Box::new(Expr::Int(2))),
            ]),
        ]);
        assert_eq!(expr.simplify(), expected);
    }

    #[test]
    fn merges_powers_of_same_base() {
        let expr = Expr::int(2)
            .power(Expr::sym("i"))
            .multiply(Expr::int(2).power(Expr::sym("i").negate()))
            .multiply(n());
        assert_eq!(expr.simplify(), n());
    }

    #[test]
    fn cancels_sum_against_its_reciprocal() {
        let e = n().add(Expr::one()).divide(Expr::int(2));
        let expr = e.clone().multiply(e.power(Expr::Int(-1)));
        assert_eq!(expr.simplify(), Expr::one());
    }

    #[test]
    fn logarithm_identities() {
        assert_eq!(Expr::int(8).log().simplify(), Expr::Int(3));
        assert_eq!(Expr::rational(1, 2).log().simplify(), Expr::Int(-1));
        assert_eq!(
            n().divide(Expr::int(2)).log().simplify(),
            Expr::Sum(vec![n().log(), Expr::Int(-1)])
        );
        assert_eq!(
            n().power(Expr::int(2)).log().simplify(),
            Expr::Product(vec![Expr::Int(2), n().log()])
        );
    }

    #[test]
    fn constant_to_log_power_becomes_size_power() {
        let expr = Expr::int(2).power(n().log());
        assert_eq!(expr.simplify(), n());
        let strassen = Expr::int(7).power(n().log()).simplify();
        assert_eq!(
            strassen,
            Expr::Power(Box::new(n()), Box::new(Expr::int(7).log()))
        );
    }

    #[test]
    fn constant_exponent_sums_split() {
        let expr = Expr::int(2).power(n().add(Expr::one()));
        assert_eq!(
            expr.simplify(),
            Expr::Product(vec![
                Expr::Int(2),
                Expr::Power(Box::new(Expr::Int(2)), Box::new(n()))
            ])
        );
    }

    #[test]
    fn is_idempotent_on_nested_input() {
        let expr = n()
            .add(Expr::one())
            .power(Expr::int(3))
            .multiply(Expr::sym("m").sub(n()))
            .add(Expr::rational(1, 3).multiply(n().log()));
        let once = expr.simplify();
        assert_eq!(once.simplify(), once);
    }

    fn n_plus_one_squared() -> Expr {
        n().power(Expr::int(2))
            .add(Expr::int(2).multiply(n()))
            .add(Expr::one())
            .simplify()
    }

    #[test]
    fn squared_sum_expands() {
        let expr = n().add(Expr::one()).power(Expr::int(2));
        assert_eq!(expr.simplify(), n_plus_one_squared());
    }

    #[test]
    fn sum_times_itself_expands() {
        let expr = n().add(Expr::one()).multiply(n().add(Expr::one()));
        let simplified = expr.simplify();
        assert_eq!(simplified, n_plus_one_squared());
        let env = std::collections::HashMap::from([("n".to_string(), 6.0)]);
        assert_eq!(simplified.eval(&env), Some(49.0));
    }

    #[test]
    fn squared_triangular_number_expands() {
        let triangular = n().multiply(n().add(Expr::one())).divide(Expr::int(2));
        let squared = triangular.power(Expr::int(2)).simplify();
        assert!(!matches!(squared, Expr::Power(_, _)));
        let env = std::collections::HashMap::from([("n".to_string(), 4.0)]);
        assert_eq!(squared.eval(&env), Some(100.0));
    }

    #[test]
    fn zero_factor_annihilates() {
        let expr = Expr::zero().multiply(n().add(Expr::sym("m")));
        assert_eq!(expr.simplify(), Expr::zero());
    }

    #[test]
    fn overflowing_constants_stay_symbolic() {
        let expr = Expr::int(10).power(Expr::int(40));
        assert!(matches!(expr.simplify(), Expr::Power(_, _)));
    }
}
