//! Recursion-tree method.

use super::model::{
    growth_of, theta_of, DominatingLevel, Recurrence, RecurrenceShape, TreeLevel, TreeResult,
};
use super::{SolutionPayload, SolveMethod, Solved};
use crate::errors::{AnalysisError, Result};
use crate::expr::{dominant_term, Expr};
use crate::summation::{fresh_bound_name, SummationEngine};
use num_traits::ToPrimitive;
use std::collections::BTreeSet;

/// Levels listed explicitly before the leaves.
const LISTED_LEVELS: i64 = 3;
const EPS: f64 = 1e-9;

pub fn check(recurrence: &Recurrence) -> std::result::Result<(), String> {
    super::iteration::check(recurrence).map_err(|reason| {
        if recurrence.is_divide_and_conquer() {
            reason
        } else {
            "subproblems of different sizes make an unbalanced tree".to_string()
        }
    })
}

pub fn solve(recurrence: &Recurrence, engine: &SummationEngine) -> Result<Solved> {
    check(recurrence)
        .map_err(|reason| AnalysisError::not_applicable(SolveMethod::RecursionTree, reason))?;
    let var = recurrence.size_variable.as_str();
    let n = recurrence.size();
    let index = fresh_bound_name(&BTreeSet::from([var.to_string()]));

    // Per level: node count a^i and subproblem size g^i(n).
    let (branching, depth, size_at): (Expr, Expr, Box<dyn Fn(&Expr) -> Expr>) =
        match &recurrence.shape {
            RecurrenceShape::DivideAndConquer { a, b } => {
                let b = Expr::constant(*b);
                let depth = n
                    .clone()
                    .divide(Expr::int(recurrence.n0.max(1)))
                    .log()
                    .divide(b.clone().log())
                    .simplify();
                let size_n = n.clone();
                (
                    Expr::int(i64::from(*a)),
                    depth,
                    Box::new(move |i: &Expr| {
                        size_n.clone().multiply(b.clone().power(i.clone().negate()))
                    }),
                )
            }
            RecurrenceShape::Linear { .. } => {
                let Some((offset, c)) = recurrence.single_offset() else {
                    return Err(AnalysisError::not_applicable(
                        SolveMethod::RecursionTree,
                        "subproblems of different sizes make an unbalanced tree",
                    ));
                };
                let k = Expr::int(i64::from(offset));
                let depth = n
                    .clone()
                    .sub(Expr::int(recurrence.n0.max(0)))
                    .divide(k.clone())
                    .simplify();
                let size_n = n.clone();
                (
                    Expr::int(c),
                    depth,
                    Box::new(move |i: &Expr| size_n.clone().sub(k.clone().multiply(i.clone()))),
                )
            }
        };

    let level = |i: &Expr| {
        let count = branching.clone().power(i.clone()).simplify();
        let size = size_at(i).simplify();
        let cost = recurrence.f_n.substitute(var, &size).simplify();
        let total = count.clone().multiply(cost.clone()).simplify();
        (count, size, cost, total)
    };

    let mut levels = Vec::new();
    for i in 0..LISTED_LEVELS {
        let (node_count, subproblem_size, per_node_cost, level_total) = level(&Expr::int(i));
        levels.push(TreeLevel {
            level: i.to_string(),
            node_count,
            subproblem_size,
            per_node_cost,
            level_total,
        });
    }
    let leaf_count = branching.clone().power(depth.clone()).simplify();
    levels.push(TreeLevel {
        level: "leaves".to_string(),
        node_count: leaf_count.clone(),
        subproblem_size: Expr::int(recurrence.n0.max(1)),
        per_node_cost: Expr::one(),
        level_total: leaf_count.clone(),
    });

    let dominating = dominating_level(recurrence, &branching);
    let i = Expr::sym(&index);
    let (_, _, _, level_total) = level(&i);
    let upper = depth.clone().sub(Expr::one()).simplify();
    let mut closure = engine.close(
        &Expr::finite_sum(level_total, index.clone(), Expr::zero(), upper.clone())
            .add(leaf_count.clone()),
    );
    let mut notes = Vec::new();
    if !closure.complete && dominating == DominatingLevel::Leaves {
        notes.push(crate::core::Note::info(
            "the leaves dominate; summing node counts per level",
        ));
        closure = engine.close(
            &Expr::finite_sum(
                branching.clone().power(i.clone()),
                index.clone(),
                Expr::zero(),
                upper,
            )
            .add(leaf_count),
        );
    }
    notes.extend(closure.notes.iter().cloned());

    let total = closure.expr.clone();
    let growth = growth_of(&dominant_term(&total, var), var).ok_or_else(|| {
        AnalysisError::not_applicable(
            SolveMethod::RecursionTree,
            format!("could not classify the tree total {total}"),
        )
    })?;
    let theta = theta_of(&growth, var);

    let mut steps = vec![recurrence.summary()];
    for level in &levels {
        steps.push(format!(
            "level {}: {} node(s) of size {}, {} each, {} in total",
            level.level,
            level.node_count,
            level.subproblem_size,
            level.per_node_cost,
            level.level_total
        ));
    }
    steps.push(format!("tree depth: {depth}"));
    steps.push(format!("dominating level: {dominating}"));
    steps.push(format!("sum over levels: {total} = {theta}"));

    Ok(Solved {
        payload: SolutionPayload::RecursionTree(TreeResult {
            levels,
            depth,
            total,
            dominating,
        }),
        theta,
        steps,
        notes,
    })
}

/// Compare level totals: they shrink, stay level or grow by `a / b^d` per
/// level.
fn dominating_level(recurrence: &Recurrence, branching: &Expr) -> DominatingLevel {
    let degree = recurrence.work_growth().map_or(0.0, |g| g.degree);
    let ratio = match &recurrence.shape {
        RecurrenceShape::DivideAndConquer { a, b } => {
            let b = b.to_f64().unwrap_or(2.0);
            f64::from(*a) / b.powf(degree)
        }
        RecurrenceShape::Linear { .. } => branching.eval_constant().unwrap_or(1.0),
    };
    if ratio < 1.0 - EPS {
        DominatingLevel::Root
    } else if ratio > 1.0 + EPS {
        DominatingLevel::Leaves
    } else {
        DominatingLevel::AllEqual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CasePolicy;
    use num_rational::Rational64;
    use std::collections::BTreeMap;

    fn divide(a: u32, b: i64, f_n: Expr) -> Recurrence {
        Recurrence {
            procedure: "F".into(),
            size_variable: "n".into(),
            shape: RecurrenceShape::DivideAndConquer {
                a,
                b: Rational64::from_integer(b),
            },
            f_n,
            n0: 1,
            applicable: true,
            method: None,
            call_sites: 2,
            case_policy: CasePolicy::Worst,
            work_source: String::new(),
        }
    }

    fn tree(rec: &Recurrence) -> (TreeResult, String) {
        match solve(rec, &SummationEngine::default()) {
            Ok(Solved {
                payload: SolutionPayload::RecursionTree(result),
                theta,
                ..
            }) => (result, theta),
            other => panic!("expected a recursion tree, got {other:?}"),
        }
    }

    #[test]
    fn merge_sort_levels_cost_the_same() {
        let (result, theta) = tree(&divide(2, 2, Expr::sym("n")));
        assert_eq!(result.dominating, DominatingLevel::AllEqual);
        assert_eq!(result.levels[1].node_count, Expr::int(2));
        assert_eq!(result.levels[1].level_total, Expr::sym("n"));
        assert_eq!(theta, "Θ(n·log(n))");
    }

    #[test]
    fn quadratic_combine_is_root_dominated() {
        let (result, theta) = tree(&divide(2, 2, Expr::sym("n").power(Expr::int(2))));
        assert_eq!(result.dominating, DominatingLevel::Root);
        assert_eq!(theta, "Θ(n^2)");
    }

    #[test]
    fn many_small_calls_are_leaf_dominated() {
        let (result, _) = tree(&divide(4, 2, Expr::sym("n")));
        assert_eq!(result.dominating, DominatingLevel::Leaves);
        assert_eq!(result.levels.last().map(|l| l.level.as_str()), Some("leaves"));
    }

    #[test]
    fn fibonacci_tree_is_unbalanced() {
        let mut rec = divide(1, 2, Expr::one());
        rec.shape = RecurrenceShape::Linear {
            coefficients: BTreeMap::from([(1, 1), (2, 1)]),
        };
        assert!(check(&rec).is_err());
    }
}
