//! Algebraic expression model.
//!
//! A small, immutable expression tree over integers, exact rationals,
//! named symbols, sums, products, powers, base-2 logarithms and unevaluated
//! finite sums. Every other stage of the engine (cost rows, summation
//! closure, recurrences) works in terms of [`Expr`].
//!
//! Construction helpers build nodes without normalizing them; call
//! [`Expr::simplify`] to obtain the canonical form. Two simplified
//! expressions that are mathematically equal polynomials compare equal
//! with `==`.

mod display;
mod eval;
pub mod growth;
mod simplify;

pub use growth::{asymptotic_monomial, dominant_term, format_number, term_growth, Growth};
pub use simplify::DEFAULT_SIMPLIFY_BUDGET;

use num_rational::Rational64;
use num_traits::{CheckedMul, One, Zero};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

/// An algebraic expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expr {
    Int(i64),
    Rational(Rational64),
    Symbol(String),
    Sum(Vec<Expr>),
    Product(Vec<Expr>),
    Power(Box<Expr>, Box<Expr>),
    /// Base-2 logarithm.
    Log(Box<Expr>),
    /// `Σ_{var=lower}^{upper} body`, with `var` bound inside `body`.
    FiniteSum {
        body: Box<Expr>,
        var: String,
        lower: Box<Expr>,
        upper: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Int(value)
    }

    pub fn zero() -> Self {
        Expr::Int(0)
    }

    pub fn one() -> Self {
        Expr::Int(1)
    }

    /// Exact rational `numer/denom`, normalized to an integer when possible.
    ///
    /// # Panics
    /// Panics if `denom` is zero.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Self::constant(Rational64::new(numer, denom))
    }

    /// Canonical constant node for a rational value.
    pub fn constant(value: Rational64) -> Self {
        if value.is_integer() {
            Expr::Int(value.to_integer())
        } else {
            Expr::Rational(value)
        }
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn add(self, other: Expr) -> Self {
        Expr::Sum(vec![self, other])
    }

    pub fn sub(self, other: Expr) -> Self {
        Expr::Sum(vec![self, other.negate()])
    }

    pub fn multiply(self, other: Expr) -> Self {
        Expr::Product(vec![self, other])
    }

    pub fn divide(self, other: Expr) -> Self {
        Expr::Product(vec![self, other.power(Expr::Int(-1))])
    }

    pub fn power(self, exponent: Expr) -> Self {
        Expr::Power(Box::new(self), Box::new(exponent))
    }

    pub fn negate(self) -> Self {
        Expr::Product(vec![Expr::Int(-1), self])
    }

    pub fn log(self) -> Self {
        Expr::Log(Box::new(self))
    }

    pub fn sum_of(terms: Vec<Expr>) -> Self {
        match terms.len() {
            0 => Expr::zero(),
            1 => terms.into_iter().next().unwrap_or_else(Expr::zero),
            _ => Expr::Sum(terms),
        }
    }

    pub fn product_of(factors: Vec<Expr>) -> Self {
        match factors.len() {
            0 => Expr::one(),
            1 => factors.into_iter().next().unwrap_or_else(Expr::one),
            _ => Expr::Product(factors),
        }
    }

    pub fn finite_sum(body: Expr, var: impl Into<String>, lower: Expr, upper: Expr) -> Self {
        Expr::FiniteSum {
            body: Box::new(body),
            var: var.into(),
            lower: Box::new(lower),
            upper: Box::new(upper),
        }
    }

    /// The rational value of a constant node.
    pub fn as_rational(&self) -> Option<Rational64> {
        match self {
            Expr::Int(v) => Some(Rational64::from_integer(*v)),
            Expr::Rational(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        self.as_rational()
            .filter(|r| r.is_integer())
            .map(|r| r.to_integer())
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Int(_) | Expr::Rational(_))
    }

    pub fn is_zero(&self) -> bool {
        self.as_rational().is_some_and(|r| r.is_zero())
    }

    pub fn is_one(&self) -> bool {
        self.as_rational().is_some_and(|r| r.is_one())
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Expr::Symbol(s) if s == name)
    }

    /// Structural equality after normalizing both sides.
    pub fn equals_structurally(&self, other: &Expr) -> bool {
        self.simplify() == other.simplify()
    }

    /// Symbols that occur free (outside the scope of a binding finite sum).
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
        match self {
            Expr::Int(_) | Expr::Rational(_) => {}
            Expr::Symbol(name) => {
                if !bound.iter().any(|b| b == name) {
                    out.insert(name.clone());
                }
            }
            Expr::Sum(items) | Expr::Product(items) => {
                items.iter().for_each(|e| e.collect_free(bound, out));
            }
            Expr::Power(base, exp) => {
                base.collect_free(bound, out);
                exp.collect_free(bound, out);
            }
            Expr::Log(arg) => arg.collect_free(bound, out),
            Expr::FiniteSum {
                body,
                var,
                lower,
                upper,
            } => {
                lower.collect_free(bound, out);
                upper.collect_free(bound, out);
                bound.push(var.clone());
                body.collect_free(bound, out);
                bound.pop();
            }
        }
    }

    /// Whether `name` occurs free in this expression.
    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Expr::Int(_) | Expr::Rational(_) => false,
            Expr::Symbol(s) => s == name,
            Expr::Sum(items) | Expr::Product(items) => {
                items.iter().any(|e| e.contains_symbol(name))
            }
            Expr::Power(base, exp) => base.contains_symbol(name) || exp.contains_symbol(name),
            Expr::Log(arg) => arg.contains_symbol(name),
            Expr::FiniteSum {
                body,
                var,
                lower,
                upper,
            } => {
                lower.contains_symbol(name)
                    || upper.contains_symbol(name)
                    || (var != name && body.contains_symbol(name))
            }
        }
    }

    pub fn contains_finite_sum(&self) -> bool {
        match self {
            Expr::FiniteSum { .. } => true,
            Expr::Int(_) | Expr::Rational(_) | Expr::Symbol(_) => false,
            Expr::Sum(items) | Expr::Product(items) => items.iter().any(Expr::contains_finite_sum),
            Expr::Power(base, exp) => base.contains_finite_sum() || exp.contains_finite_sum(),
            Expr::Log(arg) => arg.contains_finite_sum(),
        }
    }

    pub fn count_finite_sums(&self) -> usize {
        match self {
            Expr::FiniteSum {
                body, lower, upper, ..
            } => 1 + body.count_finite_sums() + lower.count_finite_sums() + upper.count_finite_sums(),
            Expr::Int(_) | Expr::Rational(_) | Expr::Symbol(_) => 0,
            Expr::Sum(items) | Expr::Product(items) => {
                items.iter().map(Expr::count_finite_sums).sum()
            }
            Expr::Power(base, exp) => base.count_finite_sums() + exp.count_finite_sums(),
            Expr::Log(arg) => arg.count_finite_sums(),
        }
    }

    /// Replace every free occurrence of `var` by `value`.
    ///
    /// A finite sum that binds `var` shadows it: its body is left untouched
    /// while its bounds are still substituted.
    pub fn substitute(&self, var: &str, value: &Expr) -> Expr {
        match self {
            Expr::Symbol(name) if name == var => value.clone(),
            Expr::Int(_) | Expr::Rational(_) | Expr::Symbol(_) => self.clone(),
            Expr::Sum(items) => Expr::Sum(items.iter().map(|e| e.substitute(var, value)).collect()),
            Expr::Product(items) => {
                Expr::Product(items.iter().map(|e| e.substitute(var, value)).collect())
            }
            Expr::Power(base, exp) => Expr::Power(
                Box::new(base.substitute(var, value)),
                Box::new(exp.substitute(var, value)),
            ),
            Expr::Log(arg) => Expr::Log(Box::new(arg.substitute(var, value))),
            Expr::FiniteSum {
                body,
                var: bound,
                lower,
                upper,
            } => {
                let body = if bound == var {
                    body.as_ref().clone()
                } else {
                    body.substitute(var, value)
                };
                Expr::FiniteSum {
                    body: Box::new(body),
                    var: bound.clone(),
                    lower: Box::new(lower.substitute(var, value)),
                    upper: Box::new(upper.substitute(var, value)),
                }
            }
        }
    }

    /// Rename a bound or free symbol everywhere, including binders.
    pub fn rename_symbol(&self, from: &str, to: &str) -> Expr {
        match self {
            Expr::Symbol(name) if name == from => Expr::Symbol(to.to_string()),
            Expr::Int(_) | Expr::Rational(_) | Expr::Symbol(_) => self.clone(),
            Expr::Sum(items) => Expr::Sum(items.iter().map(|e| e.rename_symbol(from, to)).collect()),
            Expr::Product(items) => {
                Expr::Product(items.iter().map(|e| e.rename_symbol(from, to)).collect())
            }
            Expr::Power(base, exp) => Expr::Power(
                Box::new(base.rename_symbol(from, to)),
                Box::new(exp.rename_symbol(from, to)),
            ),
            Expr::Log(arg) => Expr::Log(Box::new(arg.rename_symbol(from, to))),
            Expr::FiniteSum {
                body,
                var,
                lower,
                upper,
            } => Expr::FiniteSum {
                body: Box::new(body.rename_symbol(from, to)),
                var: if var == from { to.to_string() } else { var.clone() },
                lower: Box::new(lower.rename_symbol(from, to)),
                upper: Box::new(upper.rename_symbol(from, to)),
            },
        }
    }

    /// Top-level additive terms of the expression.
    pub fn terms(&self) -> Vec<Expr> {
        match self {
            Expr::Sum(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// Top-level multiplicative factors of the expression.
    pub fn factors(&self) -> Vec<Expr> {
        match self {
            Expr::Product(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// Split a term into its rational coefficient and the remaining factors.
    pub fn split_coefficient(&self) -> (Rational64, Expr) {
        match self {
            Expr::Int(_) | Expr::Rational(_) => {
                let value = self.as_rational().unwrap_or_else(Rational64::one);
                (value, Expr::one())
            }
            Expr::Product(items) => {
                let mut coefficient = Rational64::one();
                let mut rest = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_rational().and_then(|r| coefficient.checked_mul(&r)) {
                        Some(product) => coefficient = product,
                        None => rest.push(item.clone()),
                    }
                }
                (coefficient, Expr::product_of(rest))
            }
            other => (Rational64::one(), other.clone()),
        }
    }
}

impl Default for Expr {
    fn default() -> Self {
        Expr::zero()
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Int(value)
    }
}

impl From<Rational64> for Expr {
    fn from(value: Rational64) -> Self {
        Expr::constant(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::sym(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
