//! Method applicability and automatic selection.

use super::model::{MethodReport, Recurrence, RecurrenceShape};
use super::{characteristic, extract, iteration, master, tree, SolveMethod};
use crate::ast::Program;
use crate::core::AnalysisOptions;
use crate::errors::Result;

/// Why `method` cannot solve `recurrence`, if it cannot.
pub fn check(recurrence: &Recurrence, method: SolveMethod) -> std::result::Result<(), String> {
    match method {
        SolveMethod::Master => master::check(recurrence),
        SolveMethod::Iteration => iteration::check(recurrence),
        SolveMethod::RecursionTree => tree::check(recurrence),
        SolveMethod::CharacteristicEquation => characteristic::check(recurrence),
    }
}

/// Every method whose preconditions hold, in declaration order.
pub fn applicable_methods(recurrence: &Recurrence) -> Vec<SolveMethod> {
    SolveMethod::all()
        .iter()
        .copied()
        .filter(|m| check(recurrence, *m).is_ok())
        .collect()
}

/// Methods to try, best first.
///
/// Linear recurrences go to the characteristic equation. A single
/// divide-and-conquer call goes to the Master theorem; several calls go
/// there only when `f(n)` can be compared with `n^(log_b a)`, otherwise
/// to the recursion tree. Iteration is the last resort for every shape.
pub fn candidates(recurrence: &Recurrence) -> Vec<SolveMethod> {
    let preferred = match &recurrence.shape {
        RecurrenceShape::Linear { .. } => vec![
            SolveMethod::CharacteristicEquation,
            SolveMethod::Iteration,
            SolveMethod::RecursionTree,
        ],
        RecurrenceShape::DivideAndConquer { .. } if recurrence.call_sites <= 1 => vec![
            SolveMethod::Master,
            SolveMethod::Iteration,
            SolveMethod::RecursionTree,
        ],
        RecurrenceShape::DivideAndConquer { .. } if master::check(recurrence).is_ok() => vec![
            SolveMethod::Master,
            SolveMethod::RecursionTree,
            SolveMethod::Iteration,
        ],
        RecurrenceShape::DivideAndConquer { .. } => {
            vec![SolveMethod::RecursionTree, SolveMethod::Iteration]
        }
    };
    preferred
        .into_iter()
        .filter(|m| check(recurrence, *m).is_ok())
        .collect()
}

/// The automatically selected method.
pub fn select_method(recurrence: &Recurrence) -> SolveMethod {
    candidates(recurrence)
        .first()
        .copied()
        .unwrap_or(SolveMethod::Iteration)
}

/// Advisory list of methods for the program's principal recurrence.
pub fn detect_applicable_methods(
    program: &Program,
    options: &AnalysisOptions,
) -> Result<MethodReport> {
    let extraction = extract::extract(program, options)?;
    let recurrence = &extraction.recurrence;
    let mut methods = applicable_methods(recurrence);
    // The Master theorem is always offered; solving reports why it fails.
    if !methods.contains(&SolveMethod::Master) {
        methods.insert(0, SolveMethod::Master);
    }
    Ok(MethodReport {
        methods,
        default: select_method(recurrence),
        recurrence_summary: recurrence.summary(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CasePolicy;
    use crate::expr::Expr;
    use num_rational::Rational64;
    use std::collections::BTreeMap;

    fn recurrence(shape: RecurrenceShape, f_n: Expr, call_sites: usize) -> Recurrence {
        Recurrence {
            procedure: "F".into(),
            size_variable: "n".into(),
            shape,
            f_n,
            n0: 1,
            applicable: true,
            method: None,
            call_sites,
            case_policy: CasePolicy::Worst,
            work_source: String::new(),
        }
    }

    fn halving(a: u32, call_sites: usize, f_n: Expr) -> Recurrence {
        recurrence(
            RecurrenceShape::DivideAndConquer {
                a,
                b: Rational64::from_integer(2),
            },
            f_n,
            call_sites,
        )
    }

    #[test]
    fn linear_shapes_prefer_the_characteristic_equation() {
        let fib = recurrence(
            RecurrenceShape::Linear {
                coefficients: BTreeMap::from([(1, 1), (2, 1)]),
            },
            Expr::one(),
            2,
        );
        assert_eq!(select_method(&fib), SolveMethod::CharacteristicEquation);
        assert_eq!(
            applicable_methods(&fib),
            vec![SolveMethod::CharacteristicEquation]
        );
    }

    #[test]
    fn single_offset_chain_can_be_unrolled() {
        let chain = recurrence(
            RecurrenceShape::Linear {
                coefficients: BTreeMap::from([(1, 1)]),
            },
            Expr::sym("n"),
            1,
        );
        assert_eq!(
            applicable_methods(&chain),
            vec![
                SolveMethod::Iteration,
                SolveMethod::RecursionTree,
                SolveMethod::CharacteristicEquation
            ]
        );
    }

    #[test]
    fn divide_and_conquer_prefers_master() {
        assert_eq!(
            select_method(&halving(1, 1, Expr::one())),
            SolveMethod::Master
        );
        assert_eq!(
            select_method(&halving(2, 2, Expr::sym("n"))),
            SolveMethod::Master
        );
    }

    #[test]
    fn uncomparable_work_falls_back_to_the_tree() {
        let odd = halving(2, 2, Expr::sym("n").power(Expr::sym("n")));
        assert!(master::check(&odd).is_err());
        assert_eq!(select_method(&odd), SolveMethod::RecursionTree);
    }
}
