//! Capture-avoiding renaming of summation indices.

use crate::expr::Expr;
use std::collections::BTreeSet;

/// Preferred index names, tried in order before falling back to suffixes.
const INDEX_ALPHABET: [&str; 11] = ["i", "j", "k", "l", "p", "q", "r", "s", "u", "v", "w"];

/// First index name not in `taken`.
pub fn fresh_bound_name(taken: &BTreeSet<String>) -> String {
    if let Some(name) = INDEX_ALPHABET.iter().find(|name| !taken.contains(**name)) {
        return (*name).to_string();
    }
    (1..)
        .map(|index| format!("i{index}"))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| "i0".to_string())
}

/// Every name bound by a finite sum inside `expr`.
pub fn bound_names(expr: &Expr) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_bound(expr, &mut out);
    out
}

fn collect_bound(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Int(_) | Expr::Rational(_) | Expr::Symbol(_) => {}
        Expr::Sum(items) | Expr::Product(items) => items.iter().for_each(|e| collect_bound(e, out)),
        Expr::Power(base, exp) => {
            collect_bound(base, out);
            collect_bound(exp, out);
        }
        Expr::Log(arg) => collect_bound(arg, out),
        Expr::FiniteSum {
            body,
            var,
            lower,
            upper,
        } => {
            out.insert(var.clone());
            collect_bound(body, out);
            collect_bound(lower, out);
            collect_bound(upper, out);
        }
    }
}

/// Rename every inner binder called `name` so that wrapping `expr` in a new
/// sum over `name` cannot capture it.
///
/// The renamed binders get names that are neither free nor bound anywhere in
/// `expr` and differ from `name` itself.
pub fn avoid_capture(expr: &Expr, name: &str) -> Expr {
    if !bound_names(expr).contains(name) {
        return expr.clone();
    }
    let mut taken = bound_names(expr);
    taken.extend(expr.free_symbols());
    taken.insert(name.to_string());
    rename_binders(expr, name, &mut taken)
}

fn rename_binders(expr: &Expr, name: &str, taken: &mut BTreeSet<String>) -> Expr {
    match expr {
        Expr::Int(_) | Expr::Rational(_) | Expr::Symbol(_) => expr.clone(),
        Expr::Sum(items) => Expr::Sum(
            items
                .iter()
                .map(|e| rename_binders(e, name, taken))
                .collect(),
        ),
        Expr::Product(items) => Expr::Product(
            items
                .iter()
                .map(|e| rename_binders(e, name, taken))
                .collect(),
        ),
        Expr::Power(base, exp) => Expr::Power(
            Box::new(rename_binders(base, name, taken)),
            Box::new(rename_binders(exp, name, taken)),
        ),
        Expr::Log(arg) => Expr::Log(Box::new(rename_binders(arg, name, taken))),
        Expr::FiniteSum {
            body,
            var,
            lower,
            upper,
        } => {
            let lower = rename_binders(lower, name, taken);
            let upper = rename_binders(upper, name, taken);
            if var == name {
                let fresh = fresh_bound_name(taken);
                taken.insert(fresh.clone());
                log::debug!("renaming summation index {} to {}", var, fresh);
                Expr::FiniteSum {
                    body: Box::new(body.rename_symbol(name, &fresh)),
                    var: fresh,
                    lower: Box::new(lower),
                    upper: Box::new(upper),
                }
            } else {
                Expr::FiniteSum {
                    body: Box::new(rename_binders(body, name, taken)),
                    var: var.clone(),
                    lower: Box::new(lower),
                    upper: Box::new(upper),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_then_suffix() {
        let mut taken = BTreeSet::new();
        assert_eq!(fresh_bound_name(&taken), "i");
        taken.insert("i".to_string());
        assert_eq!(fresh_bound_name(&taken), "j");
        for name in INDEX_ALPHABET {
            taken.insert(name.to_string());
        }
        assert_eq!(fresh_bound_name(&taken), "i1");
    }

    #[test]
    fn inner_binder_with_same_name_is_renamed() {
        let inner = Expr::finite_sum(Expr::sym("i"), "i", Expr::one(), Expr::sym("i"));
        let renamed = avoid_capture(&inner, "i");
        match renamed {
            Expr::FiniteSum {
                body, var, upper, ..
            } => {
                assert_eq!(var, "j");
                assert_eq!(*body, Expr::sym("j"));
                // the upper bound still refers to the enclosing index
                assert_eq!(*upper, Expr::sym("i"));
            }
            other => panic!("expected a finite sum, got {other:?}"),
        }
    }
}
