//! Iteration (substitution) method.
//!
//! Unrolls `T(n) = f(n) + a·f(g(n)) + a²·f(g(g(n))) + ...` until the base
//! case, writes the unrolled work as a finite sum over the level `i`, and
//! closes it with the summation engine.

use super::model::{growth_of, theta_of, IterationResult, Recurrence, RecurrenceShape};
use super::{SolutionPayload, SolveMethod, Solved};
use crate::core::Note;
use crate::errors::{AnalysisError, Result};
use crate::expr::{dominant_term, Expr};
use crate::summation::{fresh_bound_name, SummationEngine};
use num_traits::One;
use std::collections::BTreeSet;

/// Unrolled forms shown before the general one.
const SHOWN_UNROLLINGS: i64 = 3;

pub fn check(recurrence: &Recurrence) -> std::result::Result<(), String> {
    match &recurrence.shape {
        RecurrenceShape::DivideAndConquer { b, .. } if *b > num_rational::Rational64::one() => {
            Ok(())
        }
        RecurrenceShape::DivideAndConquer { .. } => {
            Err("the input must shrink by a factor b > 1".to_string())
        }
        RecurrenceShape::Linear { .. } if recurrence.single_offset().is_some() => Ok(()),
        RecurrenceShape::Linear { .. } => Err(
            "unrolling needs a single recursive term; several offsets branch into different sizes"
                .to_string(),
        ),
    }
}

/// How one unrolling step rewrites the recurrence.
struct Unrolling {
    /// Calls per level.
    a: Expr,
    /// Subproblem size after `i` steps, in terms of `n` and the level index.
    size_at: Box<dyn Fn(&Expr) -> Expr>,
    /// Steps until the base case.
    steps: Expr,
}

fn unrolling(recurrence: &Recurrence) -> Option<Unrolling> {
    let n = recurrence.size();
    let n0 = Expr::int(recurrence.n0.max(1));
    match &recurrence.shape {
        RecurrenceShape::DivideAndConquer { a, b } => {
            let b = Expr::constant(*b);
            let steps = n
                .clone()
                .divide(n0)
                .log()
                .divide(b.clone().log())
                .simplify();
            let size_at = move |i: &Expr| n.clone().multiply(b.clone().power(i.clone().negate()));
            Some(Unrolling {
                a: Expr::int(i64::from(*a)),
                size_at: Box::new(size_at),
                steps,
            })
        }
        RecurrenceShape::Linear { .. } => {
            let (offset, c) = recurrence.single_offset()?;
            let k = Expr::int(i64::from(offset));
            let n0 = Expr::int(recurrence.n0.max(0));
            let steps = n.clone().sub(n0).divide(k.clone()).simplify();
            let size_at = move |i: &Expr| n.clone().sub(k.clone().multiply(i.clone()));
            Some(Unrolling {
                a: Expr::int(c),
                size_at: Box::new(size_at),
                steps,
            })
        }
    }
}

pub fn solve(recurrence: &Recurrence, engine: &SummationEngine) -> Result<Solved> {
    check(recurrence)
        .map_err(|reason| AnalysisError::not_applicable(SolveMethod::Iteration, reason))?;
    let unroll = unrolling(recurrence).ok_or_else(|| {
        AnalysisError::not_applicable(SolveMethod::Iteration, "no unrolling for this shape")
    })?;
    let var = recurrence.size_variable.as_str();
    let index = fresh_bound_name(&BTreeSet::from([var.to_string()]));
    let i = Expr::sym(&index);
    let work_at = |level: &Expr| {
        unroll
            .a
            .clone()
            .power(level.clone())
            .multiply(recurrence.f_n.substitute(var, &(unroll.size_at)(level)))
    };

    let mut unrolled = Vec::new();
    for j in 1..=SHOWN_UNROLLINGS {
        let partial = Expr::sum_of((0..j).map(|l| work_at(&Expr::int(l))).collect()).simplify();
        let calls = unroll.a.clone().power(Expr::int(j)).simplify();
        let size = (unroll.size_at)(&Expr::int(j)).simplify();
        let prefix = if calls.is_one() {
            String::new()
        } else {
            calls.to_string()
        };
        unrolled.push(format!("T({var}) = {partial} + {prefix}T({size})"));
    }

    let mut notes = Vec::new();
    let upper = unroll.steps.clone().sub(Expr::one()).simplify();
    let leaves = unroll.a.clone().power(unroll.steps.clone());
    let general = Expr::finite_sum(work_at(&i), index.clone(), Expr::zero(), upper.clone())
        .add(leaves.clone());
    let mut closure = engine.close(&general);

    if !closure.complete && !unroll.a.is_one() {
        // Geometric growth of a^i swamps the polynomial factor f(g^i(n)).
        notes.push(Note::info(
            "the level work a^i dominates the shrinking f(n); summing a^i alone",
        ));
        let dominant_part = Expr::finite_sum(
            unroll.a.clone().power(i.clone()),
            index.clone(),
            Expr::zero(),
            upper,
        )
        .add(leaves);
        closure = engine.close(&dominant_part);
    }
    notes.extend(closure.notes.iter().cloned());

    let closed = closure.expr.clone();
    let dominant = dominant_term(&closed, var);
    let growth = growth_of(&dominant, var).ok_or_else(|| {
        AnalysisError::not_applicable(
            SolveMethod::Iteration,
            format!("could not classify the closed form {closed}"),
        )
    })?;
    let theta = theta_of(&growth, var);

    let mut steps = vec![recurrence.summary()];
    steps.extend(unrolled.iter().cloned());
    steps.push(format!("after k steps: T({var}) = {general}"));
    steps.push(format!(
        "the base case is reached after k = {} steps",
        unroll.steps
    ));
    steps.extend(closure.steps.iter().map(ToString::to_string));
    steps.push(format!("T({var}) = {closed} = {theta}"));

    Ok(Solved {
        payload: SolutionPayload::Iteration(IterationResult {
            unrolled,
            general_form: general,
            steps: unroll.steps,
            closed,
        }),
        theta,
        steps,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CasePolicy;
    use num_rational::Rational64;
    use std::collections::BTreeMap;

    fn recurrence(shape: RecurrenceShape, f_n: Expr) -> Recurrence {
        Recurrence {
            procedure: "F".into(),
            size_variable: "n".into(),
            shape,
            f_n,
            n0: 1,
            applicable: true,
            method: None,
            call_sites: 1,
            case_policy: CasePolicy::Worst,
            work_source: String::new(),
        }
    }

    fn theta(rec: &Recurrence) -> String {
        match solve(rec, &SummationEngine::default()) {
            Ok(solved) => solved.theta,
            Err(err) => panic!("iteration failed: {err}"),
        }
    }

    #[test]
    fn merge_sort_unrolls_to_n_log_n() {
        let rec = recurrence(
            RecurrenceShape::DivideAndConquer {
                a: 2,
                b: Rational64::from_integer(2),
            },
            Expr::sym("n"),
        );
        assert_eq!(theta(&rec), "Θ(n·log(n))");
    }

    #[test]
    fn chain_with_linear_work_is_quadratic() {
        let rec = recurrence(
            RecurrenceShape::Linear {
                coefficients: BTreeMap::from([(1, 1)]),
            },
            Expr::sym("n"),
        );
        assert_eq!(theta(&rec), "Θ(n^2)");
    }

    #[test]
    fn doubling_chain_is_exponential() {
        let rec = recurrence(
            RecurrenceShape::Linear {
                coefficients: BTreeMap::from([(1, 2)]),
            },
            Expr::sym("n"),
        );
        assert_eq!(theta(&rec), "Θ(2^n)");
    }

    #[test]
    fn several_offsets_are_not_unrolled() {
        let rec = recurrence(
            RecurrenceShape::Linear {
                coefficients: BTreeMap::from([(1, 1), (2, 1)]),
            },
            Expr::one(),
        );
        assert!(check(&rec).is_err());
    }
}
