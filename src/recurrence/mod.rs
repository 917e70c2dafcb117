//! Recurrence extraction and solving.
//!
//! [`extract`] turns a self-recursive procedure into a [`Recurrence`];
//! one of four methods then solves it:
//!
//! - [`master`]: the Master theorem for `a·T(n/b) + f(n)`
//! - [`iteration`]: unroll to the base case and close the resulting sum
//! - [`tree`]: per-level recursion-tree totals
//! - [`characteristic`]: roots of the characteristic polynomial for
//!   `Σ cᵢ·T(n − i) + f(n)`
//!
//! The caller may force a method; it is validated against the recurrence
//! shape first. Otherwise [`select`] picks one.

pub mod characteristic;
pub mod extract;
pub mod iteration;
pub mod master;
pub mod model;
pub mod select;
pub mod tree;

pub use extract::{extract, Extraction};
pub use model::{
    CharacteristicResult, DominatingLevel, IterationResult, MasterCase, MasterResult,
    MethodReport, Recurrence, RecurrenceShape, RecurrenceSolution, Root, SolutionPayload,
    SolveMethod, TreeLevel, TreeResult,
};
pub use select::{applicable_methods, detect_applicable_methods, select_method};

use crate::ast::Program;
use crate::core::{AnalysisOptions, Note};
use crate::errors::{AnalysisError, Result};
use crate::observability::{set_phase, AnalysisPhase};
use crate::summation::SummationEngine;

/// Output shared by the four solvers.
#[derive(Debug)]
pub struct Solved {
    pub payload: SolutionPayload,
    pub theta: String,
    pub steps: Vec<String>,
    pub notes: Vec<Note>,
}

/// Solve `recurrence` with one specific method.
pub fn solve_with(
    recurrence: &Recurrence,
    method: SolveMethod,
    engine: &SummationEngine,
) -> Result<Solved> {
    match method {
        SolveMethod::Master => master::solve(recurrence),
        SolveMethod::Iteration => iteration::solve(recurrence, engine),
        SolveMethod::RecursionTree => tree::solve(recurrence, engine),
        SolveMethod::CharacteristicEquation => characteristic::solve(recurrence),
    }
}

/// Extract and solve the recurrence of the program's principal procedure.
///
/// A method requested through `options.method` must apply to the extracted
/// shape, else [`AnalysisError::MethodNotApplicable`] is returned. Without
/// one, the selected candidates are tried in order until one produces a
/// bound.
pub fn analyze_recursive(
    program: &Program,
    options: &AnalysisOptions,
) -> Result<RecurrenceSolution> {
    let Extraction {
        mut recurrence,
        notes: extraction_notes,
        steps: extraction_steps,
    } = extract(program, options)?;
    let _phase = set_phase(AnalysisPhase::RecurrenceSolving);
    let engine =
        SummationEngine::new(options.closure_budget).with_simplify_budget(options.simplify_budget);

    let (method, solved) = match options.method {
        Some(method) => {
            if let Err(reason) = select::check(&recurrence, method) {
                recurrence.applicable = false;
                return Err(AnalysisError::not_applicable(method, reason));
            }
            (method, solve_with(&recurrence, method, &engine)?)
        }
        None => solve_auto(&recurrence, &engine)?,
    };
    log::debug!("solved {} with {}", recurrence.summary(), method);

    recurrence.method = Some(method);
    recurrence.applicable = true;
    let mut derivation_steps = extraction_steps;
    derivation_steps.push(format!("method: {method}"));
    derivation_steps.extend(solved.steps);
    let mut notes = extraction_notes;
    notes.extend(solved.notes);
    for note in notes.iter().filter(|n| n.is_degradation()) {
        log::warn!("{}: {}", recurrence.procedure, note.message);
    }

    Ok(RecurrenceSolution {
        recurrence,
        method,
        payload: solved.payload,
        theta: solved.theta,
        derivation_steps,
        notes,
    })
}

fn solve_auto(recurrence: &Recurrence, engine: &SummationEngine) -> Result<(SolveMethod, Solved)> {
    let candidates = select::candidates(recurrence);
    let mut last_error = None;
    for method in candidates {
        match solve_with(recurrence, method, engine) {
            Ok(mut solved) => {
                if let Some(err) = &last_error {
                    solved
                        .notes
                        .insert(0, Note::info(format!("fell back to {method}: {err}")));
                }
                return Ok((method, solved));
            }
            Err(err) => {
                log::debug!("{} failed on {}: {}", method, recurrence.summary(), err);
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        AnalysisError::not_applicable(
            SolveMethod::Iteration,
            format!("no method applies to {}", recurrence.summary()),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstExpr, BinOp, Procedure, Stmt};
    use crate::observability::get_current_context;

    fn call(line: u32, name: &str, arg: AstExpr) -> Stmt {
        Stmt::Return {
            line,
            value: Some(AstExpr::call(name, vec![arg])),
        }
    }

    fn program(name: &str, body: Vec<Stmt>) -> Program {
        Program {
            procedures: vec![Procedure {
                name: name.into(),
                params: vec!["n".into()],
                body,
                line: 1,
            }],
        }
    }

    fn countdown() -> Program {
        let n = AstExpr::ident("n");
        program(
            "Count",
            vec![
                Stmt::If {
                    line: 2,
                    cond: AstExpr::binary(BinOp::Le, n.clone(), AstExpr::number(0)),
                    then_branch: vec![Stmt::Return {
                        line: 3,
                        value: Some(AstExpr::number(0)),
                    }],
                    else_branch: None,
                },
                call(
                    4,
                    "Count",
                    AstExpr::binary(BinOp::Sub, n, AstExpr::number(1)),
                ),
            ],
        )
    }

    #[test]
    fn countdown_is_linear() {
        let solution = analyze_recursive(&countdown(), &AnalysisOptions::default()).unwrap();
        assert_eq!(solution.method, SolveMethod::CharacteristicEquation);
        assert_eq!(solution.theta, "Θ(n)");
        assert_eq!(solution.recurrence.method, Some(SolveMethod::CharacteristicEquation));
        assert!(solution
            .derivation_steps
            .iter()
            .any(|s| s.contains("characteristic equation")));
    }

    #[test]
    fn failed_extraction_hands_the_phase_back() {
        let _outer = set_phase(AnalysisPhase::Classification);
        let flat = program("Flat", vec![Stmt::Return { line: 2, value: None }]);
        let err = analyze_recursive(&flat, &AnalysisOptions::default()).unwrap_err();
        assert_eq!(err.reason(), "no_recursive_calls");
        assert_eq!(
            get_current_context().phase,
            Some(AnalysisPhase::Classification)
        );
    }

    #[test]
    fn forced_method_is_validated() {
        let options = AnalysisOptions::default().with_method(Some(SolveMethod::Master));
        let err = analyze_recursive(&countdown(), &options).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MethodNotApplicable {
                method: SolveMethod::Master,
                ..
            }
        ));
    }

    #[test]
    fn forced_iteration_agrees_with_default() {
        let options = AnalysisOptions::default().with_method(Some(SolveMethod::Iteration));
        let solution = analyze_recursive(&countdown(), &options).unwrap();
        assert_eq!(solution.method, SolveMethod::Iteration);
        assert_eq!(solution.theta, "Θ(n)");
    }

    #[test]
    fn methods_always_offer_master() {
        let report =
            detect_applicable_methods(&countdown(), &AnalysisOptions::default()).unwrap();
        assert_eq!(report.methods[0], SolveMethod::Master);
        assert_eq!(report.default, SolveMethod::CharacteristicEquation);
        assert_eq!(report.recurrence_summary, "T(n) = T(n - 1) + 1");
    }
}
