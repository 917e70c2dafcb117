//! Iteration counts of `while` and `repeat` loops.
//!
//! A loop is resolved when one conjunct of its condition compares a control
//! variable against a limit and the body updates that variable
//! unconditionally in one of four shapes:
//!
//! | shape          | update       | condition | iterations              |
//! |----------------|--------------|-----------|-------------------------|
//! | additive       | `v ← v + k`  | `v < L`   | `(L − v₀)/k`            |
//! | subtractive    | `v ← v − k`  | `v > L`   | `(v₀ − L)/k`            |
//! | multiplicative | `v ← v · k`  | `v < L`   | `log(L/v₀)/log(k)`      |
//! | divisive       | `v ← v / k`  | `v > L`   | `log(v₀/L)/log(k)`      |
//!
//! Inclusive comparisons add one iteration. Two variables closing in on a
//! midpoint (`lo ≤ hi` with `mid ← (lo + hi) div 2`) are recognized as
//! bisection. Conjuncts reading array elements or calls are data-dependent
//! and reported separately so the caller can apply the case policy.

use crate::ast::{to_expr, walk, AstExpr, BinOp, Stmt, UnaryOp};
use crate::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateShape {
    Additive(Expr),
    Subtractive(Expr),
    Multiplicative(Expr),
    Divisive(Expr),
}

impl UpdateShape {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateShape::Additive(_) => "additive",
            UpdateShape::Subtractive(_) => "subtractive",
            UpdateShape::Multiplicative(_) => "multiplicative",
            UpdateShape::Divisive(_) => "divisive",
        }
    }
}

/// A resolved iteration count.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopBound {
    pub iterations: Expr,
    pub control: String,
    pub shape: &'static str,
    /// Conjuncts whose truth depends on the data, e.g. `A[j] > key`.
    pub data_dependent: Vec<AstExpr>,
}

/// Split a condition into its `and`-conjuncts.
pub fn conjuncts(cond: &AstExpr) -> Vec<&AstExpr> {
    match cond {
        AstExpr::Binary {
            op: BinOp::And,
            lhs,
            rhs,
        } => {
            let mut out = conjuncts(lhs);
            out.extend(conjuncts(rhs));
            out
        }
        other => vec![other],
    }
}

/// Logical negation, pushed through `and`/`or` and comparisons.
pub fn negate_condition(cond: &AstExpr) -> AstExpr {
    match cond {
        AstExpr::Binary { op, lhs, rhs } => match op {
            BinOp::And => AstExpr::binary(BinOp::Or, negate_condition(lhs), negate_condition(rhs)),
            BinOp::Or => AstExpr::binary(BinOp::And, negate_condition(lhs), negate_condition(rhs)),
            _ => match op.negated() {
                Some(negated) => AstExpr::binary(negated, (**lhs).clone(), (**rhs).clone()),
                None => not(cond),
            },
        },
        AstExpr::Unary {
            op: UnaryOp::Not,
            operand,
        } => (**operand).clone(),
        AstExpr::Bool { value } => AstExpr::Bool { value: !value },
        other => not(other),
    }
}

fn not(cond: &AstExpr) -> AstExpr {
    AstExpr::Unary {
        op: UnaryOp::Not,
        operand: Box::new(cond.clone()),
    }
}

fn is_data_dependent(expr: &AstExpr) -> bool {
    match expr {
        AstExpr::Index { .. } | AstExpr::Call { .. } => true,
        AstExpr::Binary { lhs, rhs, .. } => is_data_dependent(lhs) || is_data_dependent(rhs),
        AstExpr::Unary { operand, .. } => is_data_dependent(operand),
        _ => false,
    }
}

/// Unconditional update of `var` among the top-level statements of `body`.
pub fn find_update(body: &[Stmt], var: &str, size_variable: &str) -> Option<UpdateShape> {
    body.iter().find_map(|stmt| match stmt {
        Stmt::Assign { target, value, .. } if target.as_ident() == Some(var) => {
            classify_update(value, var, size_variable)
        }
        _ => None,
    })
}

fn classify_update(value: &AstExpr, var: &str, size_variable: &str) -> Option<UpdateShape> {
    let AstExpr::Binary { op, lhs, rhs } = value else {
        return None;
    };
    let is_var = |e: &AstExpr| e.as_ident() == Some(var);
    let step = |e: &AstExpr| (!e.mentions(var)).then(|| to_expr(e, size_variable).simplify());
    let shape = match op {
        BinOp::Add if is_var(lhs) => UpdateShape::Additive(step(rhs)?),
        BinOp::Add if is_var(rhs) => UpdateShape::Additive(step(lhs)?),
        BinOp::Sub if is_var(lhs) => UpdateShape::Subtractive(step(rhs)?),
        BinOp::Mul if is_var(lhs) => UpdateShape::Multiplicative(step(rhs)?),
        BinOp::Mul if is_var(rhs) => UpdateShape::Multiplicative(step(lhs)?),
        BinOp::Div | BinOp::IntDiv if is_var(lhs) => UpdateShape::Divisive(step(rhs)?),
        _ => return None,
    };
    Some(normalize(shape))
}

/// `v + (−k)` is a subtraction and vice versa.
fn normalize(shape: UpdateShape) -> UpdateShape {
    let negative = |k: &Expr| k.as_rational().is_some_and(|r| r < 0.into());
    match shape {
        UpdateShape::Additive(k) if negative(&k) => {
            UpdateShape::Subtractive(k.negate().simplify())
        }
        UpdateShape::Subtractive(k) if negative(&k) => UpdateShape::Additive(k.negate().simplify()),
        other => other,
    }
}

/// Comparison normalized to `control OP limit`.
struct Comparison<'a> {
    control: &'a str,
    op: BinOp,
    limit: &'a AstExpr,
}

fn as_comparison<'a>(
    conjunct: &'a AstExpr,
    body: &[Stmt],
    size_variable: &str,
) -> Option<Comparison<'a>> {
    let AstExpr::Binary { op, lhs, rhs } = conjunct else {
        return None;
    };
    if !op.is_comparison() {
        return None;
    }
    let updated = |e: &'a AstExpr| -> Option<&'a str> {
        e.as_ident()
            .filter(|v| find_update(body, v, size_variable).is_some())
    };
    if let Some(control) = updated(lhs.as_ref()) {
        return Some(Comparison {
            control,
            op: *op,
            limit: rhs.as_ref(),
        });
    }
    updated(rhs.as_ref()).map(|control| Comparison {
        control,
        op: op.flipped(),
        limit: lhs.as_ref(),
    })
}

fn count_for(shape: &UpdateShape, op: BinOp, start: Expr, limit: Expr) -> Option<Expr> {
    let plus_one = |e: Expr| e.add(Expr::one());
    let count = match (shape, op) {
        (UpdateShape::Additive(k), BinOp::Lt | BinOp::Ne) => limit.sub(start).divide(k.clone()),
        (UpdateShape::Additive(k), BinOp::Le) => plus_one(limit.sub(start).divide(k.clone())),
        (UpdateShape::Subtractive(k), BinOp::Gt | BinOp::Ne) => {
            start.sub(limit).divide(k.clone())
        }
        (UpdateShape::Subtractive(k), BinOp::Ge) => plus_one(start.sub(limit).divide(k.clone())),
        (UpdateShape::Multiplicative(k), BinOp::Lt | BinOp::Ne | BinOp::Le) => {
            if start.is_zero() || k.as_rational().is_some_and(|r| r <= 1.into()) {
                return None;
            }
            let steps = limit.divide(start).log().divide(k.clone().log());
            if op == BinOp::Le {
                plus_one(steps)
            } else {
                steps
            }
        }
        (UpdateShape::Divisive(k), BinOp::Gt | BinOp::Ne) if limit.is_zero() => {
            plus_one(start.log().divide(k.clone().log()))
        }
        (UpdateShape::Divisive(k), BinOp::Gt | BinOp::Ge) => {
            if k.as_rational().is_some_and(|r| r <= 1.into()) {
                return None;
            }
            let steps = start.divide(limit).log().divide(k.clone().log());
            if op == BinOp::Ge {
                plus_one(steps)
            } else {
                steps
            }
        }
        _ => return None,
    };
    Some(count.simplify())
}

/// Two bounds converging on a midpoint, as in binary search.
fn bisection(
    conjunct: &AstExpr,
    body: &[Stmt],
    initial: &dyn Fn(&str) -> Expr,
) -> Option<(String, Expr)> {
    let AstExpr::Binary { op, lhs, rhs } = conjunct else {
        return None;
    };
    let (low, high, inclusive) = match (op, lhs.as_ident(), rhs.as_ident()) {
        (BinOp::Le, Some(l), Some(h)) => (l, h, true),
        (BinOp::Lt, Some(l), Some(h)) => (l, h, false),
        (BinOp::Ge, Some(h), Some(l)) => (l, h, true),
        (BinOp::Gt, Some(h), Some(l)) => (l, h, false),
        _ => return None,
    };
    let statements = walk::flatten(body);
    let halves = |name: &str| {
        statements.iter().any(|stmt| match stmt {
            Stmt::Assign { target, value, .. } => {
                target.as_ident() == Some(name)
                    && value.mentions(low)
                    && value.mentions(high)
                    && divides_by_two(value)
            }
            _ => false,
        })
    };
    let assigned_from = |var: &str, mid: &str| {
        statements.iter().any(|stmt| match stmt {
            Stmt::Assign { target, value, .. } => {
                target.as_ident() == Some(var) && value.mentions(mid)
            }
            _ => false,
        })
    };
    let mid = statements.iter().find_map(|stmt| match stmt {
        Stmt::Assign { target, .. } => target.as_ident().filter(|&name| halves(name)),
        _ => None,
    })?;
    if !assigned_from(low, mid) || !assigned_from(high, mid) {
        return None;
    }
    let width = initial(high).sub(initial(low)).add(Expr::one());
    let steps = width.log();
    let count = if inclusive {
        steps.add(Expr::one())
    } else {
        steps
    };
    Some((format!("{low}..{high}"), count.simplify()))
}

fn divides_by_two(expr: &AstExpr) -> bool {
    match expr {
        AstExpr::Binary {
            op: BinOp::Div | BinOp::IntDiv,
            rhs,
            ..
        } => rhs.as_integer() == Some(2),
        AstExpr::Call { name, args } if args.len() == 1 => {
            matches!(name.as_str(), "floor" | "ceil" | "ceiling") && divides_by_two(&args[0])
        }
        AstExpr::Binary { lhs, rhs, .. } => divides_by_two(lhs) || divides_by_two(rhs),
        _ => false,
    }
}

/// Infer how many times `while cond do body` iterates.
///
/// `initial` yields the value a variable holds on loop entry.
pub fn infer_while_bound(
    cond: &AstExpr,
    body: &[Stmt],
    initial: &dyn Fn(&str) -> Expr,
    size_variable: &str,
) -> Option<LoopBound> {
    let parts = conjuncts(cond);
    let data_dependent: Vec<AstExpr> = parts
        .iter()
        .filter(|c| is_data_dependent(c))
        .map(|c| (*c).clone())
        .collect();

    for conjunct in parts.iter().filter(|c| !is_data_dependent(c)) {
        if let Some(comparison) = as_comparison(conjunct, body, size_variable) {
            let Some(shape) = find_update(body, comparison.control, size_variable) else {
                continue;
            };
            let start = initial(comparison.control);
            let limit = to_expr(comparison.limit, size_variable);
            if let Some(iterations) = count_for(&shape, comparison.op, start, limit) {
                return Some(LoopBound {
                    iterations,
                    control: comparison.control.to_string(),
                    shape: shape.name(),
                    data_dependent,
                });
            }
        }
        if let Some((control, iterations)) = bisection(conjunct, body, initial) {
            return Some(LoopBound {
                iterations,
                control,
                shape: "bisection",
                data_dependent,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ident(name: &str) -> AstExpr {
        AstExpr::ident(name)
    }

    fn num(value: i64) -> AstExpr {
        AstExpr::number(value)
    }

    fn assign(line: u32, target: &str, value: AstExpr) -> Stmt {
        Stmt::Assign {
            line,
            target: ident(target),
            value,
        }
    }

    fn initial_from(values: HashMap<&'static str, Expr>) -> impl Fn(&str) -> Expr {
        move |name| values.get(name).cloned().unwrap_or_else(|| Expr::sym(name))
    }

    #[test]
    fn additive_update_counts_up_to_limit() {
        let cond = AstExpr::binary(BinOp::Le, ident("i"), ident("n"));
        let body = vec![assign(3, "i", AstExpr::binary(BinOp::Add, ident("i"), num(1)))];
        let initial = initial_from(HashMap::from([("i", Expr::one())]));
        let bound = infer_while_bound(&cond, &body, &initial, "n");
        assert_eq!(bound.map(|b| b.iterations), Some(Expr::sym("n")));
    }

    #[test]
    fn divisive_update_is_logarithmic() {
        let cond = AstExpr::binary(BinOp::Gt, ident("i"), num(1));
        let body = vec![assign(3, "i", AstExpr::binary(BinOp::IntDiv, ident("i"), num(2)))];
        let initial = initial_from(HashMap::from([("i", Expr::sym("n"))]));
        let bound = infer_while_bound(&cond, &body, &initial, "n");
        assert_eq!(bound.map(|b| b.iterations), Some(Expr::sym("n").log()));
    }

    #[test]
    fn insertion_sort_condition_is_partly_data_dependent() {
        let cond = AstExpr::binary(
            BinOp::And,
            AstExpr::binary(BinOp::Gt, ident("j"), num(0)),
            AstExpr::binary(
                BinOp::Gt,
                AstExpr::index(ident("A"), ident("j")),
                ident("key"),
            ),
        );
        let body = vec![assign(6, "j", AstExpr::binary(BinOp::Sub, ident("j"), num(1)))];
        let initial = initial_from(HashMap::from([(
            "j",
            Expr::sym("i").sub(Expr::one()),
        )]));
        let bound = infer_while_bound(&cond, &body, &initial, "n").unwrap();
        assert_eq!(bound.shape, "subtractive");
        assert_eq!(bound.data_dependent.len(), 1);
        assert_eq!(
            bound.iterations,
            Expr::sym("i").sub(Expr::one()).simplify()
        );
    }

    #[test]
    fn unconditional_update_in_unknown_shape_is_unresolved() {
        let cond = AstExpr::binary(BinOp::Lt, ident("i"), ident("n"));
        let body = vec![assign(
            3,
            "i",
            AstExpr::binary(BinOp::Mod, ident("i"), num(7)),
        )];
        let initial = initial_from(HashMap::new());
        assert!(infer_while_bound(&cond, &body, &initial, "n").is_none());
    }

    #[test]
    fn repeat_condition_negates_through_conjunctions() {
        let until = AstExpr::binary(
            BinOp::Or,
            AstExpr::binary(BinOp::Ge, ident("i"), ident("n")),
            AstExpr::Bool { value: false },
        );
        let negated = negate_condition(&until);
        let expected = AstExpr::binary(
            BinOp::And,
            AstExpr::binary(BinOp::Lt, ident("i"), ident("n")),
            AstExpr::Bool { value: true },
        );
        assert_eq!(negated, expected);
    }
}
