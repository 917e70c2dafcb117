//! Summation closure engine.
//!
//! Reduces an expression containing [`Expr::FiniteSum`] nodes to a sum-free
//! equivalent, innermost sums first. Each reduction is recorded as a
//! [`ClosureStep`] so reports can show how the closed form was obtained.
//! Sums that no rule can close are left in place and reported as
//! degradations rather than errors.

pub mod rename;
pub mod rules;

pub use rename::{avoid_capture, fresh_bound_name};
pub use rules::{close_sum, faulhaber, poly_coefficients, ClosedSum};

use crate::core::Note;
use crate::expr::{Expr, DEFAULT_SIMPLIFY_BUDGET};
use serde::Serialize;
use std::collections::BTreeSet;

/// Default number of closure passes.
pub const DEFAULT_CLOSURE_BUDGET: usize = 20;

/// One named reduction, as shown in derivation trails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosureStep {
    pub rule: String,
    pub before: Expr,
    pub after: Expr,
}

impl std::fmt::Display for ClosureStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} = {}", self.rule, self.before, self.after)
    }
}

/// Outcome of closing an expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Closure {
    pub expr: Expr,
    pub steps: Vec<ClosureStep>,
    pub notes: Vec<Note>,
    /// `true` when no finite sum remains.
    pub complete: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SummationEngine {
    budget: usize,
    simplify_budget: usize,
}

impl Default for SummationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSURE_BUDGET)
    }
}

impl SummationEngine {
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
            simplify_budget: DEFAULT_SIMPLIFY_BUDGET,
        }
    }

    pub fn with_simplify_budget(mut self, budget: usize) -> Self {
        self.simplify_budget = budget.max(1);
        self
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Close every finite sum in `expr`.
    pub fn close(&self, expr: &Expr) -> Closure {
        let _span = tracing::debug_span!("summation_closure").entered();
        let mut current = expr.simplify_with_budget(self.simplify_budget);
        let mut steps = Vec::new();
        let mut stuck: BTreeSet<Expr> = BTreeSet::new();
        let mut exhausted = true;

        for pass in 0..self.budget {
            if !current.contains_finite_sum() {
                exhausted = false;
                break;
            }
            let before_pass = current.clone();
            let reduced = self.close_innermost(&current, &mut steps, &mut stuck);
            current = reduced.simplify_with_budget(self.simplify_budget);
            log::debug!("closure pass {}: {}", pass + 1, current);
            if current == before_pass {
                exhausted = false;
                break;
            }
        }

        let mut notes: Vec<Note> = stuck
            .iter()
            .map(|sum| Note::degradation(format!("could not close {sum}")))
            .collect();

        let complete = !current.contains_finite_sum();
        if !complete && exhausted {
            log::warn!(
                "summation closure budget of {} passes exhausted",
                self.budget
            );
            steps.push(ClosureStep {
                rule: "budget-exhausted".to_string(),
                before: current.clone(),
                after: current.clone(),
            });
            notes.push(Note::degradation(format!(
                "summation closure stopped after {} passes",
                self.budget
            )));
        }

        Closure {
            expr: current,
            steps,
            notes,
            complete,
        }
    }

    fn close_innermost(
        &self,
        expr: &Expr,
        steps: &mut Vec<ClosureStep>,
        stuck: &mut BTreeSet<Expr>,
    ) -> Expr {
        match expr {
            Expr::Int(_) | Expr::Rational(_) | Expr::Symbol(_) => expr.clone(),
            Expr::Sum(items) => Expr::Sum(
                items
                    .iter()
                    .map(|e| self.close_innermost(e, steps, stuck))
                    .collect(),
            ),
            Expr::Product(items) => Expr::Product(
                items
                    .iter()
                    .map(|e| self.close_innermost(e, steps, stuck))
                    .collect(),
            ),
            Expr::Power(base, exp) => Expr::Power(
                Box::new(self.close_innermost(base, steps, stuck)),
                Box::new(self.close_innermost(exp, steps, stuck)),
            ),
            Expr::Log(arg) => Expr::Log(Box::new(self.close_innermost(arg, steps, stuck))),
            Expr::FiniteSum {
                body,
                var,
                lower,
                upper,
            } => {
                let body = self
                    .close_innermost(body, steps, stuck)
                    .simplify_with_budget(self.simplify_budget);
                let lower = self.close_innermost(lower, steps, stuck);
                let upper = self.close_innermost(upper, steps, stuck);
                let before = Expr::finite_sum(body.clone(), var.clone(), lower.clone(), upper.clone());
                if body.contains_finite_sum()
                    || lower.contains_finite_sum()
                    || upper.contains_finite_sum()
                {
                    return before;
                }
                match close_sum(&body, var, &lower, &upper) {
                    Some(closed) => {
                        log::debug!("[{}] {} = {}", closed.rule, before, closed.result);
                        steps.push(ClosureStep {
                            rule: closed.rule,
                            before,
                            after: closed.result.clone(),
                        });
                        closed.result
                    }
                    None => {
                        if stuck.insert(before.clone()) {
                            log::warn!("could not close {}", before);
                            steps.push(ClosureStep {
                                rule: "could-not-close".to_string(),
                                before: before.clone(),
                                after: before.clone(),
                            });
                        }
                        before
                    }
                }
            }
        }
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
    fn nested_sums_close_innermost_first() {
        let inner = Expr::finite_sum(Expr::one(), "j", Expr::one(), Expr::sym("i"));
        let outer = Expr::finite_sum(inner, "i", Expr::one(), n());
        let closure = SummationEngine::default().close(&outer);
        assert!(closure.complete);
        let rules: Vec<&str> = closure.steps.iter().map(|s| s.rule.as_str()).collect();
        assert_eq!(rules, vec!["constant-body", "identity-body"]);
        let expected = n().multiply(n().add(Expr::one())).divide(Expr::int(2));
        assert_eq!(closure.expr, expected.simplify());
    }

    #[test]
    fn unclosable_sum_is_reported_once() {
        let sum = Expr::finite_sum(Expr::sym("i").log(), "i", Expr::one(), n());
        let closure = SummationEngine::default().close(&sum.clone().add(n()));
        assert!(!closure.complete);
        assert_eq!(closure.notes.len(), 1);
        assert!(closure.notes[0].is_degradation());
        let stuck = closure
            .steps
            .iter()
            .filter(|s| s.rule == "could-not-close")
            .count();
        assert_eq!(stuck, 1);
    }

    #[test]
    fn one_pass_closes_a_whole_nest() {
        let mut expr = Expr::one();
        for var in ["a", "b", "c"] {
            expr = Expr::finite_sum(expr, var, Expr::one(), n());
        }
        let closure = SummationEngine::new(1).close(&expr);
        assert!(closure.complete);

        let nested = Expr::finite_sum(
            Expr::finite_sum(Expr::sym("b").log(), "b", Expr::one(), Expr::sym("a")),
            "a",
            Expr::one(),
            n(),
        );
        let closure = SummationEngine::new(1).close(&nested);
        assert!(!closure.complete);
        assert_eq!(closure.notes.len(), 1);
    }
}
