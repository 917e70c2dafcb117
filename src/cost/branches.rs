//! Control-flow facts about blocks and the branch selection policy.

use super::ledger::PendingRow;
use crate::ast::Stmt;
use crate::core::CasePolicy;
use crate::expr::{term_growth, Expr, Growth};
use crate::summation::SummationEngine;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How control leaves a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Normal,
    Break,
    Return,
}

impl Flow {
    pub fn exits(&self) -> bool {
        *self != Flow::Normal
    }
}

/// How the worst and best cases compare the two arms of an `if`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum BranchSelection {
    /// Compare the closed-form cost of each arm by growth class, then by
    /// number of rows.
    #[default]
    ClosedCost,
    /// Compare the number of rows in each arm.
    RowCount,
}

/// One arm of an `if`, visited into its own buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitedBranch {
    pub rows: Vec<PendingRow>,
    pub flow: Flow,
    /// `false` for the missing `else` of a one-armed `if`.
    pub present: bool,
}

impl VisitedBranch {
    pub fn absent() -> Self {
        Self {
            rows: Vec::new(),
            flow: Flow::Normal,
            present: false,
        }
    }

    pub fn exits(&self) -> bool {
        self.flow.exits()
    }
}

/// Whether every path through `body` leaves it via `return` or `break`.
pub fn always_exits(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::Return { .. } | Stmt::Break { .. } => true,
        Stmt::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => always_exits(then_branch) && always_exits(else_branch),
        _ => false,
    })
}

/// Whether some path through `body` leaves it via `return` or `break`,
/// ignoring exits nested in inner loops.
pub fn may_exit(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::Return { .. } | Stmt::Break { .. } => true,
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => may_exit(then_branch) || else_branch.as_deref().is_some_and(may_exit),
        _ => false,
    })
}

/// Whether a loop body leaves the loop during its first iteration under
/// `policy`. The best case assumes any conditional exit is taken.
pub fn exits_on_first_iteration(body: &[Stmt], policy: CasePolicy) -> bool {
    always_exits(body) || (policy == CasePolicy::Best && may_exit(body))
}

/// For an `if` inside a loop, which arm is a "found it" return: an arm that
/// returns while its sibling does not leave the loop. `Some(true)` is the
/// then arm.
pub fn success_side(then_branch: &[Stmt], else_branch: Option<&[Stmt]>) -> Option<bool> {
    let returns = |block: &[Stmt]| block.iter().any(|s| matches!(s, Stmt::Return { .. }));
    let else_exits = else_branch.is_some_and(may_exit);
    if returns(then_branch) && !else_exits {
        return Some(true);
    }
    match else_branch {
        Some(block) if returns(block) && !may_exit(then_branch) => Some(false),
        _ => None,
    }
}

/// Growth of a buffer's total count in `var`, if it can be classified.
fn closed_growth(rows: &[PendingRow], var: &str, engine: &SummationEngine) -> Option<Growth> {
    let total = Expr::sum_of(rows.iter().map(|r| r.raw_count.clone()).collect());
    let closure = engine.close(&total);
    if !closure.complete {
        return None;
    }
    closure
        .expr
        .terms()
        .iter()
        .map(|t| term_growth(t, var))
        .try_fold(Growth::constant(), |best, g| {
            let g = g?;
            Some(if g.cmp_order(&best) == Ordering::Greater {
                g
            } else {
                best
            })
        })
}

/// Order two arms by cost: `Greater` means `a` is the heavier one.
pub fn compare_cost(
    a: &VisitedBranch,
    b: &VisitedBranch,
    selection: BranchSelection,
    var: &str,
    engine: &SummationEngine,
) -> Ordering {
    let by_rows = a.rows.len().cmp(&b.rows.len());
    match selection {
        BranchSelection::RowCount => by_rows,
        BranchSelection::ClosedCost => {
            match (
                closed_growth(&a.rows, var, engine),
                closed_growth(&b.rows, var, engine),
            ) {
                (Some(ga), Some(gb)) if !a.rows.is_empty() && !b.rows.is_empty() => {
                    ga.cmp_order(&gb).then(by_rows)
                }
                _ => by_rows,
            }
        }
    }
}
