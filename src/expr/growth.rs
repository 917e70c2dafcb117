//! Asymptotic growth view of expressions in a single size variable.
//!
//! Every term `c · b^(αn) · n^d · log(n)^k` is summarized by its
//! [`Growth`] triple `(b^α, d, k)`. Terms are ordered first by exponential
//! base, then polynomial degree, then log power, which is the usual
//! asymptotic order for this family.

use super::Expr;
use serde::Serialize;
use std::cmp::Ordering;

const EPS: f64 = 1e-9;

/// Growth class of a single term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Growth {
    /// `1.0` for non-exponential terms.
    pub exp_base: f64,
    pub degree: f64,
    pub log_power: f64,
}

impl Default for Growth {
    fn default() -> Self {
        Self::constant()
    }
}

impl Growth {
    pub fn constant() -> Self {
        Self {
            exp_base: 1.0,
            degree: 0.0,
            log_power: 0.0,
        }
    }

    pub fn polynomial(degree: f64) -> Self {
        Self {
            degree,
            ..Self::constant()
        }
    }

    pub fn poly_log(degree: f64, log_power: f64) -> Self {
        Self {
            exp_base: 1.0,
            degree,
            log_power,
        }
    }

    pub fn exponential(base: f64) -> Self {
        Self {
            exp_base: base,
            ..Self::constant()
        }
    }

    pub fn is_constant(&self) -> bool {
        self.cmp_order(&Self::constant()) == Ordering::Equal
    }

    pub fn is_exponential(&self) -> bool {
        self.exp_base > 1.0 + EPS
    }

    pub fn multiply(self, other: Growth) -> Growth {
        Growth {
            exp_base: self.exp_base * other.exp_base,
            degree: self.degree + other.degree,
            log_power: self.log_power + other.log_power,
        }
    }

    pub fn pow(self, k: f64) -> Growth {
        Growth {
            exp_base: self.exp_base.powf(k),
            degree: self.degree * k,
            log_power: self.log_power * k,
        }
    }

    /// Total asymptotic order with a small tolerance on each component.
    pub fn cmp_order(&self, other: &Growth) -> Ordering {
        fn cmp_eps(a: f64, b: f64) -> Ordering {
            if (a - b).abs() <= EPS {
                Ordering::Equal
            } else if a < b {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        cmp_eps(self.exp_base, other.exp_base)
            .then_with(|| cmp_eps(self.degree, other.degree))
            .then_with(|| cmp_eps(self.log_power, other.log_power))
    }

    /// Render as a monomial in `var`, e.g. `n^2·log(n)` or `2^n`.
    pub fn render(&self, var: &str) -> String {
        let mut parts = Vec::new();
        if self.is_exponential() {
            parts.push(format!("{}^{}", format_number(self.exp_base), var));
        }
        if self.degree.abs() > EPS {
            if (self.degree - 1.0).abs() <= EPS {
                parts.push(var.to_string());
            } else {
                parts.push(format!("{}^{}", var, format_number(self.degree)));
            }
        }
        if self.log_power.abs() > EPS {
            if (self.log_power - 1.0).abs() <= EPS {
                parts.push(format!("log({var})"));
            } else {
                parts.push(format!("log({var})^{}", format_number(self.log_power)));
            }
        }
        if parts.is_empty() {
            "1".to_string()
        } else {
            parts.join("·")
        }
    }
}

/// Integers print without a fractional part, other values with up to three
/// decimals.
pub fn format_number(value: f64) -> String {
    if (value - value.round()).abs() <= EPS {
        format!("{}", value.round() as i64)
    } else {
        let text = format!("{value:.3}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Growth of one additive term with respect to `var`.
///
/// Returns `None` for shapes outside the `b^n · n^d · log^k n` family, such
/// as unclosed finite sums or symbolic exponents.
pub fn term_growth(term: &Expr, var: &str) -> Option<Growth> {
    if !term.contains_symbol(var) {
        return Some(Growth::constant());
    }
    match term {
        Expr::Symbol(_) => Some(Growth::polynomial(1.0)),
        Expr::Product(factors) => factors
            .iter()
            .try_fold(Growth::constant(), |acc, f| Some(acc.multiply(term_growth(f, var)?))),
        Expr::Sum(terms) => terms
            .iter()
            .map(|t| term_growth(t, var))
            .try_fold(Growth::constant(), |best, g| {
                let g = g?;
                Some(if g.cmp_order(&best) == Ordering::Greater {
                    g
                } else {
                    best
                })
            }),
        Expr::Power(base, exp) if !exp.contains_symbol(var) => {
            let k = exp.eval_constant()?;
            Some(term_growth(base, var)?.pow(k))
        }
        Expr::Power(base, exp) => {
            let b = base.eval_constant().filter(|b| *b > 0.0)?;
            let slope = linear_slope(exp, var)?;
            Some(Growth::exponential(b.powf(slope)))
        }
        Expr::Log(arg) => {
            let inner = term_growth(arg, var)?;
            if inner.is_exponential() {
                Some(Growth::polynomial(1.0))
            } else if inner.degree > EPS {
                Some(Growth::poly_log(0.0, 1.0))
            } else {
                // log(log n) and log of a constant both sit below any log power.
                Some(Growth::constant())
            }
        }
        Expr::Int(_) | Expr::Rational(_) => Some(Growth::constant()),
        Expr::FiniteSum { .. } => None,
    }
}

/// Slope `α` of an exponent of the form `α·var + β`.
fn linear_slope(exp: &Expr, var: &str) -> Option<f64> {
    let mut slope = 0.0;
    for term in exp.simplify().terms() {
        if !term.contains_symbol(var) {
            continue;
        }
        let (coefficient, rest) = term.split_coefficient();
        if !rest.is_symbol(var) {
            return None;
        }
        slope += *coefficient.numer() as f64 / *coefficient.denom() as f64;
    }
    Some(slope)
}

/// Sum of the terms of `expr` with maximal growth in `var`.
///
/// Terms whose growth cannot be classified are kept alongside the leading
/// ones so that nothing unknown is silently dropped.
pub fn dominant_term(expr: &Expr, var: &str) -> Expr {
    let simplified = expr.simplify();
    let classified: Vec<(Expr, Option<Growth>)> = simplified
        .terms()
        .into_iter()
        .map(|t| {
            let g = term_growth(&t, var);
            (t, g)
        })
        .collect();

    let best = classified
        .iter()
        .filter_map(|(_, g)| *g)
        .fold(None::<Growth>, |best, g| match best {
            Some(b) if b.cmp_order(&g) != Ordering::Less => Some(b),
            _ => Some(g),
        });

    let kept: Vec<Expr> = classified
        .into_iter()
        .filter(|(_, g)| match (g, best) {
            (None, _) => true,
            (Some(g), Some(best)) => g.cmp_order(&best) == Ordering::Equal,
            (Some(_), None) => true,
        })
        .map(|(t, _)| t)
        .collect();
    Expr::sum_of(kept).simplify()
}

/// Leading monomial of a dominant term, stripped of numeric coefficients.
///
/// `3/2·n^2` becomes `n^2`; symbolic factors such as placeholders or a
/// second size variable are kept.
pub fn asymptotic_monomial(term: &Expr) -> Expr {
    let simplified = term.simplify();
    let terms = simplified.terms();
    if terms.len() > 1 {
        let mut monomials: Vec<Expr> = terms.iter().map(asymptotic_monomial).collect();
        monomials.sort();
        monomials.dedup();
        return Expr::sum_of(monomials);
    }
    let kept: Vec<Expr> = simplified
        .factors()
        .into_iter()
        .filter(|f| !f.free_symbols().is_empty())
        .collect();
    Expr::product_of(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Expr {
        Expr::sym("n")
    }

    #[test]
    fn orders_growth_classes() {
        let linear = term_growth(&n(), "n").unwrap_or_default();
        let n_log_n = term_growth(&n().multiply(n().log()), "n").unwrap_or_default();
        let square = term_growth(&n().power(Expr::int(2)), "n").unwrap_or_default();
        let exp = term_growth(&Expr::int(2).power(n()), "n").unwrap_or_default();
        assert_eq!(linear.cmp_order(&n_log_n), Ordering::Less);
        assert_eq!(n_log_n.cmp_order(&square), Ordering::Less);
        assert_eq!(square.cmp_order(&exp), Ordering::Less);
    }

    #[test]
    fn dominant_term_keeps_ties() {
        let expr = Expr::sym("C1")
            .multiply(n())
            .add(Expr::sym("C2").multiply(n()))
            .add(Expr::sym("C3"));
        let dominant = dominant_term(&expr, "n");
        assert_eq!(dominant.terms().len(), 2);
        assert!(!dominant.contains_symbol("C3"));
    }

    #[test]
    fn monomial_drops_numeric_coefficients() {
        let term = Expr::rational(3, 2).multiply(n().power(Expr::int(2)));
        assert_eq!(asymptotic_monomial(&term), n().power(Expr::int(2)).simplify());
    }

    #[test]
    fn renders_growth() {
        assert_eq!(Growth::poly_log(2.0, 1.0).render("n"), "n^2·log(n)");
        assert_eq!(Growth::constant().render("n"), "1");
        assert_eq!(Growth::exponential(2.0).render("n"), "2^n");
        assert_eq!(format_number(1.6180339), "1.618");
    }

    #[test]
    fn symbolic_exponents_are_unclassified() {
        let term = n().power(Expr::sym("k"));
        assert_eq!(term_growth(&term, "n"), None);
    }
}
