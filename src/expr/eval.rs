//! Numeric evaluation, used by tests and by the recurrence solvers to
//! compare growth rates at sample points.

use super::Expr;
use std::collections::HashMap;

/// Finite sums with more terms than this are not evaluated.
const MAX_SUM_TERMS: i64 = 100_000;

impl Expr {
    /// Evaluate with the given symbol assignment.
    ///
    /// Returns `None` for unbound symbols, non-finite results and finite
    /// sums whose bounds are not integers or span too many terms.
    pub fn eval(&self, env: &HashMap<String, f64>) -> Option<f64> {
        let value = match self {
            Expr::Int(v) => *v as f64,
            Expr::Rational(r) => *r.numer() as f64 / *r.denom() as f64,
            Expr::Symbol(name) => *env.get(name)?,
            Expr::Sum(terms) => terms
                .iter()
                .map(|t| t.eval(env))
                .sum::<Option<f64>>()?,
            Expr::Product(factors) => factors
                .iter()
                .map(|f| f.eval(env))
                .product::<Option<f64>>()?,
            Expr::Power(base, exp) => base.eval(env)?.powf(exp.eval(env)?),
            Expr::Log(arg) => arg.eval(env)?.log2(),
            Expr::FiniteSum {
                body,
                var,
                lower,
                upper,
            } => {
                let lower = lower.eval(env)?;
                let upper = upper.eval(env)?;
                if lower.fract() != 0.0 || upper.fract() != 0.0 {
                    return None;
                }
                let (lower, upper) = (lower as i64, upper as i64);
                if upper.saturating_sub(lower) > MAX_SUM_TERMS {
                    return None;
                }
                let mut scoped = env.clone();
                let mut total = 0.0;
                for i in lower..=upper {
                    scoped.insert(var.clone(), i as f64);
                    total += body.eval(&scoped)?;
                }
                total
            }
        };
        value.is_finite().then_some(value)
    }

    /// Value of an expression without free symbols.
    pub fn eval_constant(&self) -> Option<f64> {
        self.eval(&HashMap::new())
    }
}
