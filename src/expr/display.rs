//! Plain-text and LaTeX rendering of expressions.
//!
//! Sums are printed highest-growth term first so that `n^2/2 + n/2` reads
//! the way it would be written by hand. Negative exponents of a product are
//! moved below a fraction bar.

use super::Expr;
use num_rational::Rational64;
use num_traits::{CheckedMul, One, Signed};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Latex,
}

struct Renderer {
    style: Style,
}

impl Renderer {
    fn render(&self, expr: &Expr) -> String {
        match expr {
            Expr::Int(v) => v.to_string(),
            Expr::Rational(r) => self.render_rational(*r),
            Expr::Symbol(name) => name.clone(),
            Expr::Sum(terms) => self.render_sum(terms),
            Expr::Product(factors) => self.render_product(factors),
            Expr::Power(_, exp) if exp.as_rational().is_some_and(|r| r.is_negative()) => {
                self.render_product(std::slice::from_ref(expr))
            }
            Expr::Power(base, exp) => self.render_power(base, exp),
            Expr::Log(arg) => match self.style {
                Style::Plain => format!("log({})", self.render(arg)),
                Style::Latex => format!("\\log_{{2}}\\left({}\\right)", self.render(arg)),
            },
            Expr::FiniteSum {
                body,
                var,
                lower,
                upper,
            } => {
                let body = match body.as_ref() {
                    Expr::Sum(_) => format!("({})", self.render(body)),
                    other => self.render(other),
                };
                match self.style {
                    Style::Plain => format!(
                        "Σ_{{{}={}}}^{{{}}} {}",
                        var,
                        self.render(lower),
                        self.render(upper),
                        body
                    ),
                    Style::Latex => format!(
                        "\\sum_{{{}={}}}^{{{}}} {}",
                        var,
                        self.render(lower),
                        self.render(upper),
                        body
                    ),
                }
            }
        }
    }

    fn render_rational(&self, r: Rational64) -> String {
        match self.style {
            Style::Plain => format!("{}/{}", r.numer(), r.denom()),
            Style::Latex if r.is_negative() => {
                format!("-\\frac{{{}}}{{{}}}", r.numer().abs(), r.denom())
            }
            Style::Latex => format!("\\frac{{{}}}{{{}}}", r.numer(), r.denom()),
        }
    }

    fn render_sum(&self, terms: &[Expr]) -> String {
        let mut ordered: Vec<&Expr> = terms.iter().collect();
        ordered.sort_by(|a, b| {
            display_weight(b)
                .partial_cmp(&display_weight(a))
                .unwrap_or(Ordering::Equal)
        });

        let mut out = String::new();
        for (index, term) in ordered.into_iter().enumerate() {
            let (coefficient, rest) = term.split_coefficient();
            if index > 0 && coefficient.is_negative() {
                out.push_str(" - ");
                out.push_str(&self.render_scaled(-coefficient, rest));
            } else {
                if index > 0 {
                    out.push_str(" + ");
                }
                out.push_str(&self.render(term));
            }
        }
        out
    }

    fn render_scaled(&self, coefficient: Rational64, rest: Expr) -> String {
        if rest.is_one() {
            return self.render(&Expr::constant(coefficient));
        }
        let mut factors = vec![Expr::constant(coefficient)];
        factors.extend(rest.factors());
        self.render_product(&factors)
    }

    fn render_product(&self, factors: &[Expr]) -> String {
        let mut coefficient = Rational64::one();
        let mut numerator: Vec<String> = Vec::new();
        let mut denominator: Vec<String> = Vec::new();

        for factor in factors {
            if let Some(value) = factor.as_rational() {
                match coefficient.checked_mul(&value) {
                    Some(product) => coefficient = product,
                    None => numerator.push(self.render_factor(factor)),
                }
                continue;
            }
            match factor {
                Expr::Power(base, exp) => match exp.as_rational().filter(|r| r.is_negative()) {
                    Some(r) if (-r).is_one() => denominator.push(self.render_factor(base)),
                    Some(r) => {
                        denominator.push(self.render_power(base, &Expr::constant(-r)));
                    }
                    None => numerator.push(self.render_power(base, exp)),
                },
                other => numerator.push(self.render_factor(other)),
            }
        }

        let negative = coefficient.is_negative();
        let coefficient = coefficient.abs();
        if !coefficient.numer().is_one() || numerator.is_empty() {
            numerator.insert(0, coefficient.numer().to_string());
        }
        if !coefficient.denom().is_one() {
            denominator.insert(0, coefficient.denom().to_string());
        }

        let separator = match self.style {
            Style::Plain => "·",
            Style::Latex => " \\cdot ",
        };
        let top = numerator.join(separator);
        let sign = if negative { "-" } else { "" };
        if denominator.is_empty() {
            return format!("{sign}{top}");
        }
        let bottom = denominator.join(separator);
        match self.style {
            Style::Latex => format!("{sign}\\frac{{{top}}}{{{bottom}}}"),
            Style::Plain => {
                let top = if numerator.len() > 1 {
                    format!("({top})")
                } else {
                    top
                };
                let bottom = if denominator.len() > 1 {
                    format!("({bottom})")
                } else {
                    bottom
                };
                format!("{sign}{top}/{bottom}")
            }
        }
    }

    fn render_factor(&self, factor: &Expr) -> String {
        match factor {
            Expr::Sum(_) | Expr::Product(_) | Expr::FiniteSum { .. } => {
                self.parenthesize(self.render(factor))
            }
            Expr::Int(v) if *v < 0 => self.parenthesize(self.render(factor)),
            Expr::Rational(_) => self.parenthesize(self.render(factor)),
            other => self.render(other),
        }
    }

    fn render_power(&self, base: &Expr, exp: &Expr) -> String {
        let base = match base {
            Expr::Symbol(_) | Expr::Log(_) => self.render(base),
            Expr::Int(v) if *v >= 0 => self.render(base),
            other => self.parenthesize(self.render(other)),
        };
        let simple_exponent =
            matches!(exp, Expr::Symbol(_)) || matches!(exp, Expr::Int(v) if *v >= 0);
        match (self.style, simple_exponent) {
            (Style::Latex, _) => format!("{base}^{{{}}}", self.render(exp)),
            (Style::Plain, true) => format!("{base}^{}", self.render(exp)),
            (Style::Plain, false) => format!("{base}^({})", self.render(exp)),
        }
    }

    fn parenthesize(&self, inner: String) -> String {
        match self.style {
            Style::Plain => format!("({inner})"),
            Style::Latex => format!("\\left({inner}\\right)"),
        }
    }
}

/// Rough growth weight used only to order terms for printing.
fn display_weight(term: &Expr) -> f64 {
    match term {
        Expr::Int(_) | Expr::Rational(_) => 0.0,
        Expr::Symbol(_) => 1.0,
        Expr::Log(arg) => {
            if arg.free_symbols().is_empty() {
                0.0
            } else {
                0.5
            }
        }
        Expr::Power(base, exp) => match exp.as_rational() {
            Some(r) => display_weight(base) * (*r.numer() as f64 / *r.denom() as f64),
            None if exp.free_symbols().is_empty() => display_weight(base),
            None => 100.0,
        },
        Expr::Product(factors) => factors.iter().map(display_weight).sum(),
        Expr::Sum(terms) => terms.iter().map(display_weight).fold(0.0, f64::max),
        Expr::FiniteSum { body, .. } => display_weight(body) + 1.0,
    }
}

impl Expr {
    /// Human-readable rendering, e.g. `n^2/2 + n/2`.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }

    /// LaTeX rendering for report output.
    pub fn to_latex(&self) -> String {
        Renderer {
            style: Style::Latex,
        }
        .render(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = Renderer {
            style: Style::Plain,
        }
        .render(self);
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Expr {
        Expr::sym("n")
    }

    #[test]
    fn triangular_number_reads_naturally() {
        let expr = n().multiply(n().add(Expr::one())).divide(Expr::int(2)).simplify();
        assert_eq!(expr.to_string(), "n^2/2 + n/2");
    }

    #[test]
    fn negative_terms_use_minus() {
        let expr = n().power(Expr::int(2)).sub(n()).simplify();
        assert_eq!(expr.to_string(), "n^2 - n");
    }

    #[test]
    fn products_with_logs() {
        let expr = n().multiply(n().log()).simplify();
        assert_eq!(expr.to_string(), "n·log(n)");
    }

    #[test]
    fn compound_exponents_are_parenthesized() {
        let expr = Expr::int(2).power(n().sub(Expr::one()));
        assert_eq!(expr.to_string(), "2^(n - 1)");
    }

    #[test]
    fn latex_uses_frac_and_cdot() {
        let expr = Expr::sym("C1").multiply(n()).divide(Expr::int(2)).simplify();
        assert_eq!(expr.to_latex(), "\\frac{C1 \\cdot n}{2}");
    }

    #[test]
    fn finite_sums_render_bounds() {
        let expr = Expr::finite_sum(Expr::one(), "i", Expr::one(), n());
        assert_eq!(expr.to_string(), "Σ_{i=1}^{n} 1");
    }
}
