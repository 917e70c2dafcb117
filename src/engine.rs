//! Engine entry points.
//!
//! Every call builds its own ledger, summation engine and recurrence
//! context from the given [`AnalysisOptions`]; nothing is cached between
//! calls, so calls may run concurrently on different programs.

use crate::ast::Program;
use crate::classify as classifier;
use crate::core::{AlgorithmKind, AnalysisOptions, CasePolicy};
use crate::cost::{self, AnalysisResult};
use crate::errors::Result;
use crate::observability::{set_current_procedure, set_phase, AnalysisPhase};
use crate::recurrence::{self, MethodReport, RecurrenceSolution};
use serde::Serialize;
use tracing::info_span;

/// Which analyzer [`analyze`] ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Recursive and hybrid programs go to the recurrence solver.
    #[default]
    Auto,
    Iterative,
    Recursive,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "result", rename_all = "lowercase")]
pub enum Analysis {
    Iterative(AnalysisResult),
    Recursive(RecurrenceSolution),
}

impl Analysis {
    pub fn procedure(&self) -> &str {
        match self {
            Analysis::Iterative(result) => &result.procedure,
            Analysis::Recursive(solution) => &solution.recurrence.procedure,
        }
    }

    pub fn is_degraded(&self) -> bool {
        match self {
            Analysis::Iterative(result) => result.is_degraded(),
            Analysis::Recursive(solution) => solution.is_degraded(),
        }
    }
}

/// Label the program iterative, recursive, hybrid or unknown.
pub fn classify(program: &Program) -> AlgorithmKind {
    let _span = info_span!("classify").entered();
    let _phase = set_phase(AnalysisPhase::Classification);
    classifier::classify(program)
}

/// Cost table and efficiency equation of the principal procedure.
pub fn analyze_iterative(program: &Program, case_policy: CasePolicy) -> Result<AnalysisResult> {
    analyze_iterative_with(program, &AnalysisOptions::new(case_policy))
}

pub fn analyze_iterative_with(
    program: &Program,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    let procedure = program.require_principal()?;
    let _span = info_span!(
        "analyze_iterative",
        procedure = %procedure.name,
        case = %options.case_policy
    )
    .entered();
    let _phase = set_phase(AnalysisPhase::CostModel);
    let _procedure = set_current_procedure(&procedure.name);
    cost::analyze_procedure(procedure, options)
}

/// Extract and solve the principal procedure's recurrence.
pub fn analyze_recursive(program: &Program, options: &AnalysisOptions) -> Result<RecurrenceSolution> {
    let procedure = program.require_principal()?;
    let _span = info_span!(
        "analyze_recursive",
        procedure = %procedure.name,
        method = ?options.method
    )
    .entered();
    let _procedure = set_current_procedure(&procedure.name);
    recurrence::analyze_recursive(program, options)
}

/// Methods able to solve the principal procedure's recurrence.
pub fn detect_applicable_methods(program: &Program, options: &AnalysisOptions) -> Result<MethodReport> {
    let _span = info_span!("detect_applicable_methods").entered();
    let _phase = set_phase(AnalysisPhase::RecurrenceExtraction);
    recurrence::detect_applicable_methods(program, options)
}

/// Run the analyzer chosen by `mode`, classifying first under `Auto`.
pub fn analyze(program: &Program, options: &AnalysisOptions, mode: AnalysisMode) -> Result<Analysis> {
    let recursive = match mode {
        AnalysisMode::Recursive => true,
        AnalysisMode::Iterative => false,
        AnalysisMode::Auto => {
            let kind = classify(program);
            log::debug!("classified as {kind}");
            kind.prefers_recurrence()
        }
    };
    if recursive {
        analyze_recursive(program, options).map(Analysis::Recursive)
    } else {
        analyze_iterative_with(program, options).map(Analysis::Iterative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstExpr, BinOp, Procedure, Stmt};

    fn summing_loop() -> Program {
        Program {
            procedures: vec![Procedure {
                name: "Sum".into(),
                params: vec!["A".into(), "n".into()],
                body: vec![
                    Stmt::Assign {
                        line: 1,
                        target: AstExpr::ident("s"),
                        value: AstExpr::number(0),
                    },
                    Stmt::For {
                        line: 2,
                        var: "i".into(),
                        start: AstExpr::number(1),
                        end: AstExpr::ident("n"),
                        step: None,
                        downto: false,
                        body: vec![Stmt::Assign {
                            line: 3,
                            target: AstExpr::ident("s"),
                            value: AstExpr::binary(
                                BinOp::Add,
                                AstExpr::ident("s"),
                                AstExpr::index(AstExpr::ident("A"), AstExpr::ident("i")),
                            ),
                        }],
                    },
                    Stmt::Return {
                        line: 4,
                        value: Some(AstExpr::ident("s")),
                    },
                ],
                line: 1,
            }],
        }
    }

    #[test]
    fn auto_mode_runs_the_cost_model_for_loops() {
        let analysis = analyze(
            &summing_loop(),
            &AnalysisOptions::default(),
            AnalysisMode::Auto,
        )
        .unwrap();
        match analysis {
            Analysis::Iterative(result) => {
                assert_eq!(result.procedure, "Sum");
                assert_eq!(result.big_theta.as_deref(), Some("Θ(n)"));
            }
            other => panic!("expected an iterative analysis, got {other:?}"),
        }
    }

    #[test]
    fn forcing_recursive_mode_on_a_loop_reports_no_recursion() {
        let err = analyze(
            &summing_loop(),
            &AnalysisOptions::default(),
            AnalysisMode::Recursive,
        )
        .unwrap_err();
        assert_eq!(err.reason(), "no_recursive_calls");
    }

    #[test]
    fn classify_is_structural() {
        assert_eq!(classify(&summing_loop()), AlgorithmKind::Iterative);
    }
}
